use chrono::DateTime;
use chrono_tz::Tz;

/// Timestamp format used in the signal log and alert bodies.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Column layout of the confluence signal log.
pub const CONFLUENCE_LOG_HEADER: &[&str] = &[
    "timestamp",
    "price",
    "ema_fast",
    "ema_slow",
    "rsi",
    "stoch_rsi",
    "structure",
    "htf_bias",
    "ltf_bias",
    "signal",
    "confidence",
    "conf_htf",
    "conf_ltf",
    "conf_structure",
    "conf_stoch",
    "conf_ema_dist",
];

/// Column layout of the consensus signal log.
pub const CONSENSUS_LOG_HEADER: &[&str] = &[
    "timestamp",
    "price",
    "htf_bias",
    "ltf_bias",
    "structure",
    "trending",
    "signal",
    "confidence",
    "score_htf",
    "score_ltf",
    "score_structure",
    "score_trend",
    "reason",
];

/// Directional bias of a timeframe, read from closed candles only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bull,
    Bear,
    Neutral,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bull => "BULL",
            Self::Bear => "BEAR",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for Bias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Swing classification against recent extremes, relative to the slow average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingStructure {
    HigherLow,
    LowerHigh,
    Range,
}

impl SwingStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HigherLow => "higher_low",
            Self::LowerHigh => "lower_high",
            Self::Range => "range",
        }
    }
}

impl std::fmt::Display for SwingStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structure classification from comparing the two halves of a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStructure {
    Bullish,
    Bearish,
    Range,
}

impl MarketStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
            Self::Range => "RANGE",
        }
    }

    /// Raw structure score before the higher-timeframe direction check.
    pub fn raw_score(&self) -> i32 {
        match self {
            Self::Bullish => 1,
            Self::Bearish => -1,
            Self::Range => 0,
        }
    }
}

impl std::fmt::Display for MarketStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trade direction resolved for one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    PullbackLong,
    PullbackShort,
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::PullbackLong => "PULLBACK_LONG",
            Self::PullbackShort => "PULLBACK_SHORT",
            Self::None => "NONE",
        }
    }

    /// True for any direction worth alerting on.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Sign of the direction for heat coloring: +1 long side, -1 short side.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Long | Self::PullbackLong => 1.0,
            Self::Short | Self::PullbackShort => -1.0,
            Self::None => 0.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LONG" => Ok(Self::Long),
            "SHORT" => Ok(Self::Short),
            "PULLBACK_LONG" => Ok(Self::PullbackLong),
            "PULLBACK_SHORT" => Ok(Self::PullbackShort),
            "NONE" => Ok(Self::None),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// Urgency tier attached to an alert, derived from normalized confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    High,
    Medium,
    Low,
}

impl AlertLevel {
    /// Classify a confidence value normalized to the 0..=1 range.
    pub fn from_normalized(confidence: f64) -> Self {
        if confidence >= 0.6 {
            Self::High
        } else if confidence >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Indicator readings and score components behind a confluence signal.
#[derive(Debug, Clone)]
pub struct ConfluenceScores {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub stoch_rsi: f64,
    pub structure: SwingStructure,
    pub htf_bias: Bias,
    pub ltf_bias: Bias,
    pub conf_htf: f64,
    pub conf_ltf: f64,
    pub conf_structure: f64,
    pub conf_stoch: f64,
    pub conf_ema_dist: f64,
}

/// Agreement-count components behind a consensus signal.
#[derive(Debug, Clone)]
pub struct ConsensusScores {
    pub htf_bias: Bias,
    pub ltf_bias: Bias,
    pub structure: MarketStructure,
    pub trending: bool,
    pub score_htf: i32,
    pub score_ltf: i32,
    pub score_structure: i32,
    pub score_trend: i32,
}

/// Strategy-specific breakdown carried alongside a signal.
#[derive(Debug, Clone)]
pub enum Breakdown {
    Confluence(ConfluenceScores),
    Consensus(ConsensusScores),
}

impl Breakdown {
    pub fn structure_label(&self) -> &'static str {
        match self {
            Self::Confluence(scores) => scores.structure.as_str(),
            Self::Consensus(scores) => scores.structure.as_str(),
        }
    }

    pub fn htf_bias(&self) -> Bias {
        match self {
            Self::Confluence(scores) => scores.htf_bias,
            Self::Consensus(scores) => scores.htf_bias,
        }
    }

    pub fn ltf_bias(&self) -> Bias {
        match self {
            Self::Confluence(scores) => scores.ltf_bias,
            Self::Consensus(scores) => scores.ltf_bias,
        }
    }
}

/// One evaluation outcome, produced once per scheduled tick.
#[derive(Debug, Clone)]
pub struct Signal {
    pub time: DateTime<Tz>,
    pub price: f64,
    pub direction: Direction,
    pub confidence: f64,
    pub breakdown: Breakdown,
    pub reasons: Vec<String>,
}

impl Signal {
    /// Flatten the signal into one row matching its strategy's log header.
    pub fn log_row(&self) -> Vec<String> {
        let timestamp = self.time.format(TIMESTAMP_FORMAT).to_string();
        match &self.breakdown {
            Breakdown::Confluence(scores) => vec![
                timestamp,
                format!("{:.2}", self.price),
                format!("{:.2}", scores.ema_fast),
                format!("{:.2}", scores.ema_slow),
                format!("{:.2}", scores.rsi),
                format!("{:.2}", scores.stoch_rsi),
                scores.structure.to_string(),
                scores.htf_bias.to_string(),
                scores.ltf_bias.to_string(),
                self.direction.to_string(),
                format!("{:.2}", self.confidence),
                format!("{:.2}", scores.conf_htf),
                format!("{:.2}", scores.conf_ltf),
                format!("{:.2}", scores.conf_structure),
                format!("{:.2}", scores.conf_stoch),
                format!("{:.2}", scores.conf_ema_dist),
            ],
            Breakdown::Consensus(scores) => vec![
                timestamp,
                format!("{:.2}", self.price),
                scores.htf_bias.to_string(),
                scores.ltf_bias.to_string(),
                scores.structure.to_string(),
                scores.trending.to_string(),
                self.direction.to_string(),
                format!("{:.0}", self.confidence),
                scores.score_htf.to_string(),
                scores.score_ltf.to_string(),
                scores.score_structure.to_string(),
                scores.score_trend.to_string(),
                self.reasons.join(" | "),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Tz> {
        chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 3, 1, 10, 5, 0)
            .unwrap()
    }

    fn confluence_signal() -> Signal {
        Signal {
            time: sample_time(),
            price: 50123.456,
            direction: Direction::Long,
            confidence: 0.85,
            breakdown: Breakdown::Confluence(ConfluenceScores {
                ema_fast: 50100.0,
                ema_slow: 50090.0,
                rsi: 55.5,
                stoch_rsi: 12.0,
                structure: SwingStructure::HigherLow,
                htf_bias: Bias::Bull,
                ltf_bias: Bias::Bull,
                conf_htf: 0.4,
                conf_ltf: 0.2,
                conf_structure: 0.3,
                conf_stoch: 0.2,
                conf_ema_dist: 0.0,
            }),
            reasons: Vec::new(),
        }
    }

    fn consensus_signal() -> Signal {
        Signal {
            time: sample_time(),
            price: 50123.456,
            direction: Direction::Long,
            confidence: 4.0,
            breakdown: Breakdown::Consensus(ConsensusScores {
                htf_bias: Bias::Bull,
                ltf_bias: Bias::Bull,
                structure: MarketStructure::Bullish,
                trending: true,
                score_htf: 1,
                score_ltf: 1,
                score_structure: 1,
                score_trend: 1,
            }),
            reasons: vec![
                "Structure and HTF bias aligned (trend continuation).".to_string(),
                "Trending regime: Yes".to_string(),
            ],
        }
    }

    #[test]
    fn test_direction_roundtrip_and_sign() {
        for raw in ["LONG", "SHORT", "PULLBACK_LONG", "PULLBACK_SHORT", "NONE"] {
            let direction: Direction = raw.parse().unwrap();
            assert_eq!(direction.to_string(), raw);
        }
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::PullbackShort.sign(), -1.0);
        assert_eq!(Direction::None.sign(), 0.0);
        assert!(!Direction::None.is_actionable());
        assert!(Direction::PullbackLong.is_actionable());
    }

    #[test]
    fn test_alert_level_boundaries() {
        assert_eq!(AlertLevel::from_normalized(0.6), AlertLevel::High);
        assert_eq!(AlertLevel::from_normalized(0.95), AlertLevel::High);
        assert_eq!(AlertLevel::from_normalized(0.4), AlertLevel::Medium);
        assert_eq!(AlertLevel::from_normalized(0.59), AlertLevel::Medium);
        assert_eq!(AlertLevel::from_normalized(0.39), AlertLevel::Low);
        assert_eq!(AlertLevel::from_normalized(0.0), AlertLevel::Low);
    }

    #[test]
    fn test_confluence_row_matches_header() {
        let row = confluence_signal().log_row();
        assert_eq!(row.len(), CONFLUENCE_LOG_HEADER.len());
        assert_eq!(row[0], "2024-03-01 10:05");
        assert_eq!(row[1], "50123.46");
        assert_eq!(row[9], "LONG");
        assert_eq!(row[10], "0.85");
    }

    #[test]
    fn test_consensus_row_matches_header() {
        let row = consensus_signal().log_row();
        assert_eq!(row.len(), CONSENSUS_LOG_HEADER.len());
        assert_eq!(row[5], "true");
        assert_eq!(row[7], "4");
        assert_eq!(
            row[12],
            "Structure and HTF bias aligned (trend continuation). | Trending regime: Yes"
        );
    }

    #[test]
    fn test_breakdown_accessors() {
        let signal = consensus_signal();
        assert_eq!(signal.breakdown.structure_label(), "BULLISH");
        assert_eq!(signal.breakdown.htf_bias(), Bias::Bull);
        assert_eq!(signal.breakdown.ltf_bias(), Bias::Bull);
    }
}
