//! Trend regime detection.

use crate::services::indicators::{ema, value_at};

/// Minimum EMA spread relative to price for a trending call.
const TREND_SPREAD_MIN: f64 = 0.001;

/// Whether the market is trending: the fast and slow EMAs must be separated
/// by more than 0.1% of the latest price. Insufficient history reads false.
pub fn is_trending(closes: &[f64], fast_length: usize, slow_length: usize) -> bool {
    let fast = ema(closes, fast_length);
    let slow = ema(closes, slow_length);

    match (value_at(&fast, 1), value_at(&slow, 1), value_at(closes, 1)) {
        (Some(f), Some(s), Some(price)) if price > 0.0 => {
            (f - s).abs() / price > TREND_SPREAD_MIN
        }
        _ => false,
    }
}
