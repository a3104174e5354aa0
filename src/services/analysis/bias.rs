//! Directional bias of a single timeframe.

use crate::services::indicators::{ema, value_at};
use crate::types::Bias;

/// Bias from a close against its own EMA, both read `offset` candles from
/// the end. Equal or missing values read NEUTRAL.
pub fn close_vs_average(closes: &[f64], length: usize, offset: usize) -> Bias {
    let average = ema(closes, length);
    match (value_at(closes, offset), value_at(&average, offset)) {
        (Some(close), Some(avg)) if close > avg => Bias::Bull,
        (Some(close), Some(avg)) if close < avg => Bias::Bear,
        _ => Bias::Neutral,
    }
}

/// Bias from the fast EMA's position against the slow EMA at `offset`
/// candles from the end.
pub fn fast_vs_slow(closes: &[f64], fast_length: usize, slow_length: usize, offset: usize) -> Bias {
    let fast = ema(closes, fast_length);
    let slow = ema(closes, slow_length);
    match (value_at(&fast, offset), value_at(&slow, offset)) {
        (Some(f), Some(s)) if f > s => Bias::Bull,
        (Some(f), Some(s)) if f < s => Bias::Bear,
        _ => Bias::Neutral,
    }
}
