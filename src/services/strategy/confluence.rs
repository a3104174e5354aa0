//! Weighted multi-timeframe confluence strategy.
//!
//! Reads the four-hour and one-hour bias, then hunts for pullback entries
//! on the primary interval: price holding just above (or below) the slow
//! EMA with a matching swing structure. Five weighted components sum into
//! a confidence capped at 1.0, which is computed on every tick whether or
//! not an entry sets up.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::Config;
use crate::services::analysis::{close_vs_average, swing_structure};
use crate::services::indicators::{ema, rsi, stoch_rsi, value_at};
use crate::types::{
    Bias, Breakdown, ConfluenceScores, Direction, Interval, Signal, SwingStructure,
    CONFLUENCE_LOG_HEADER,
};

use super::{KlineRequest, MarketData, Strategy};

/// Candles fetched for the bias timeframes.
const BIAS_CANDLE_LIMIT: usize = 200;
/// Values are read one candle before the forming one.
const CLOSED_OFFSET: usize = 2;
const RSI_LENGTH: usize = 14;
const STOCH_SMOOTH: usize = 3;
/// Width of the pullback band around the slow EMA.
const PULLBACK_BAND: f64 = 0.002;
/// EMA proximity that earns the distance component.
const EMA_DISTANCE_MAX: f64 = 0.001;
/// Swing lookback when the config has no entry for the primary interval.
const DEFAULT_SWING_LOOKBACK: usize = 10;

pub struct ConfluenceStrategy {
    primary: Interval,
    candles: usize,
    fast_length: usize,
    slow_length: usize,
    swing_lookback: usize,
}

impl ConfluenceStrategy {
    pub fn new(config: &Config) -> Self {
        Self {
            primary: config.interval,
            candles: config.candles,
            fast_length: config.ema_fast,
            slow_length: config.ema_slow,
            swing_lookback: config.structure_lookback(config.interval, DEFAULT_SWING_LOOKBACK),
        }
    }
}

/// Sum the five weighted components, capped at 1.0.
fn combine_confidence(htf: f64, ltf: f64, structure: f64, stoch: f64, ema_dist: f64) -> f64 {
    (htf + ltf + structure + stoch + ema_dist).min(1.0)
}

impl Strategy for ConfluenceStrategy {
    fn name(&self) -> &'static str {
        "confluence"
    }

    fn requests(&self) -> Vec<KlineRequest> {
        vec![
            KlineRequest {
                interval: Interval::FourHours,
                limit: BIAS_CANDLE_LIMIT,
            },
            KlineRequest {
                interval: Interval::OneHour,
                limit: BIAS_CANDLE_LIMIT,
            },
            KlineRequest {
                interval: self.primary,
                limit: self.candles,
            },
        ]
    }

    fn log_header(&self) -> &'static [&'static str] {
        CONFLUENCE_LOG_HEADER
    }

    fn confidence_ceiling(&self) -> f64 {
        1.0
    }

    fn evaluate(&self, data: &MarketData, now: DateTime<Tz>) -> Signal {
        let htf_bias = close_vs_average(
            &data.closes(Interval::FourHours),
            self.slow_length,
            CLOSED_OFFSET,
        );
        let ltf_bias = close_vs_average(
            &data.closes(Interval::OneHour),
            self.slow_length,
            CLOSED_OFFSET,
        );

        let closes = data.closes(self.primary);
        let highs = data.highs(self.primary);
        let lows = data.lows(self.primary);

        let fast_series = ema(&closes, self.fast_length);
        let slow_series = ema(&closes, self.slow_length);
        let rsi_series = rsi(&closes, RSI_LENGTH);
        let stoch = stoch_rsi(&closes, RSI_LENGTH, STOCH_SMOOTH, STOCH_SMOOTH);

        let price = value_at(&closes, CLOSED_OFFSET);
        let fast = value_at(&fast_series, CLOSED_OFFSET);
        let slow = value_at(&slow_series, CLOSED_OFFSET);
        let rsi_value = value_at(&rsi_series, CLOSED_OFFSET);
        let stoch_value = value_at(&stoch.k, CLOSED_OFFSET);

        let structure = match (price, slow) {
            (Some(p), Some(s)) => swing_structure(p, s, &highs, &lows, self.swing_lookback),
            _ => SwingStructure::Range,
        };

        let (setup_long, setup_short) = match (price, fast, slow) {
            (Some(p), Some(f), Some(s)) => {
                let long = htf_bias == Bias::Bull
                    && p > s
                    && f <= p
                    && p <= s * (1.0 + PULLBACK_BAND)
                    && structure == SwingStructure::HigherLow;
                let short = htf_bias == Bias::Bear
                    && p < s
                    && p <= f
                    && s * (1.0 - PULLBACK_BAND) <= p
                    && structure == SwingStructure::LowerHigh;
                (long, short)
            }
            _ => (false, false),
        };

        let direction = if setup_long {
            Direction::Long
        } else if setup_short {
            Direction::Short
        } else {
            Direction::None
        };

        let conf_htf = if htf_bias != Bias::Neutral { 0.4 } else { 0.15 };
        let conf_ltf = if (direction == Direction::Long && ltf_bias == Bias::Bull)
            || (direction == Direction::Short && ltf_bias == Bias::Bear)
        {
            0.2
        } else {
            0.1
        };
        let conf_structure = if structure != SwingStructure::Range {
            0.3
        } else {
            0.0
        };
        let conf_stoch = match stoch_value {
            Some(k) if !(20.0..=80.0).contains(&k) => 0.2,
            _ => 0.0,
        };
        let conf_ema_dist = match (price, slow) {
            (Some(p), Some(s)) if p > 0.0 && (p - s).abs() / p < EMA_DISTANCE_MAX => 0.1,
            _ => 0.0,
        };

        let confidence =
            combine_confidence(conf_htf, conf_ltf, conf_structure, conf_stoch, conf_ema_dist);

        Signal {
            time: now,
            price: price.unwrap_or(f64::NAN),
            direction,
            confidence,
            breakdown: Breakdown::Confluence(ConfluenceScores {
                ema_fast: fast.unwrap_or(f64::NAN),
                ema_slow: slow.unwrap_or(f64::NAN),
                rsi: rsi_value.unwrap_or(f64::NAN),
                stoch_rsi: stoch_value.unwrap_or(f64::NAN),
                structure,
                htf_bias,
                ltf_bias,
                conf_htf,
                conf_ltf,
                conf_structure,
                conf_stoch,
                conf_ema_dist,
            }),
            reasons: Vec::new(),
        }
    }
}
