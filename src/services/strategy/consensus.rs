//! Agreement-count consensus strategy.
//!
//! Counts how many of four checks line up on the hourly frame: a non-neutral
//! four-hour bias, a non-neutral local bias, structure moving the four-hour
//! bias's way, and a trending regime. Three or more agreements resolve a
//! direction; the reasons behind the call ride along on the signal.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::Config;
use crate::services::analysis::{
    direction_aware_score, fast_vs_slow, is_trending, split_window_structure,
};
use crate::services::indicators::value_at;
use crate::types::{
    Bias, Breakdown, ConsensusScores, Direction, Interval, MarketStructure, Signal,
    CONSENSUS_LOG_HEADER,
};

use super::{KlineRequest, MarketData, Strategy};

/// Agreements needed before a direction is called.
const MIN_AGREEMENT: i32 = 3;
/// Structure lookback when the config has no entry for the hourly frame.
const DEFAULT_STRUCTURE_LOOKBACK: usize = 30;

pub struct ConsensusStrategy {
    eval_interval: Interval,
    htf_interval: Interval,
    candles: usize,
    fast_length: usize,
    slow_length: usize,
    structure_lookback: usize,
}

impl ConsensusStrategy {
    pub fn new(config: &Config) -> Self {
        Self {
            eval_interval: Interval::OneHour,
            htf_interval: Interval::FourHours,
            candles: config.candles,
            fast_length: config.ema_fast,
            slow_length: config.ema_slow,
            structure_lookback: config
                .structure_lookback(Interval::OneHour, DEFAULT_STRUCTURE_LOOKBACK),
        }
    }
}

/// Resolve a direction and its reason from the agreement count, the raw
/// structure lean and the four-hour bias.
fn resolve_direction(
    confidence: i32,
    structure: MarketStructure,
    htf_bias: Bias,
) -> (Direction, Option<&'static str>) {
    if confidence < MIN_AGREEMENT {
        return (Direction::None, Some("Confidence too low for signal."));
    }

    match structure {
        MarketStructure::Bullish => match htf_bias {
            Bias::Bull => (
                Direction::Long,
                Some("Structure and HTF bias aligned (trend continuation)."),
            ),
            Bias::Bear => (
                Direction::PullbackLong,
                Some("Structure bullish but HTF bias bearish (pullback)."),
            ),
            Bias::Neutral => (Direction::None, None),
        },
        MarketStructure::Bearish => match htf_bias {
            Bias::Bear => (
                Direction::Short,
                Some("Structure and HTF bias aligned (trend continuation)."),
            ),
            Bias::Bull => (
                Direction::PullbackShort,
                Some("Structure bearish but HTF bias bullish (pullback)."),
            ),
            Bias::Neutral => (Direction::None, None),
        },
        MarketStructure::Range => (
            Direction::None,
            Some("Market in RANGE, no clear direction."),
        ),
    }
}

impl Strategy for ConsensusStrategy {
    fn name(&self) -> &'static str {
        "consensus"
    }

    fn requests(&self) -> Vec<KlineRequest> {
        vec![
            KlineRequest {
                interval: self.eval_interval,
                limit: self.candles,
            },
            KlineRequest {
                interval: self.htf_interval,
                limit: self.candles,
            },
        ]
    }

    fn log_header(&self) -> &'static [&'static str] {
        CONSENSUS_LOG_HEADER
    }

    fn confidence_ceiling(&self) -> f64 {
        MIN_AGREEMENT as f64 + 1.0
    }

    fn evaluate(&self, data: &MarketData, now: DateTime<Tz>) -> Signal {
        let local_closes = data.closes(self.eval_interval);
        let htf_closes = data.closes(self.htf_interval);

        let htf_bias = fast_vs_slow(&htf_closes, self.fast_length, self.slow_length, 1);
        let ltf_bias = fast_vs_slow(&local_closes, self.fast_length, self.slow_length, 1);
        let structure = split_window_structure(&local_closes, self.structure_lookback);
        let trending = is_trending(&local_closes, self.fast_length, self.slow_length);

        let score_htf = i32::from(htf_bias != Bias::Neutral);
        let score_ltf = i32::from(ltf_bias != Bias::Neutral);
        let score_structure = direction_aware_score(structure, htf_bias);
        let score_trend = i32::from(trending);
        let confidence = score_htf + score_ltf + score_structure + score_trend;

        let (direction, reason) = resolve_direction(confidence, structure, htf_bias);
        let mut reasons = Vec::new();
        if let Some(reason) = reason {
            reasons.push(reason.to_string());
        }
        reasons.push(format!(
            "Trending regime: {}",
            if trending { "Yes" } else { "No" }
        ));

        Signal {
            time: now,
            price: value_at(&local_closes, 1).unwrap_or(f64::NAN),
            direction,
            confidence: confidence as f64,
            breakdown: Breakdown::Consensus(ConsensusScores {
                htf_bias,
                ltf_bias,
                structure,
                trending,
                score_htf,
                score_ltf,
                score_structure,
                score_trend,
            }),
            reasons,
        }
    }
}
