//! Market structure classification.

use crate::types::{Bias, MarketStructure, SwingStructure};

/// Swing structure for pullback entries.
///
/// Compares the last closed candle's extreme against the extremes of the
/// `lookback` window ending two candles before the series end, so neither
/// the forming candle nor the candle being judged is inside the window.
/// Which side is checked depends on price's position against the slow
/// average: above it a held low reads HIGHER_LOW, below it a capped high
/// reads LOWER_HIGH.
pub fn swing_structure(
    price: f64,
    average: f64,
    highs: &[f64],
    lows: &[f64],
    lookback: usize,
) -> SwingStructure {
    let len = highs.len().min(lows.len());
    if lookback <= 2 || len < lookback {
        return SwingStructure::Range;
    }

    let window_lows = &lows[len - lookback..len - 2];
    let window_highs = &highs[len - lookback..len - 2];
    let lowest = window_lows.iter().copied().fold(f64::INFINITY, f64::min);
    let highest = window_highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if price > average && lows[len - 2] > lowest {
        SwingStructure::HigherLow
    } else if price < average && highs[len - 2] < highest {
        SwingStructure::LowerHigh
    } else {
        SwingStructure::Range
    }
}

/// Structure from splitting the tail of a close series into halves and
/// comparing their extremes. Both bounds must shift the same way for a
/// non-range call.
///
/// A series shorter than `lookback` is clamped to what is available; a half
/// of fewer than two values always reads RANGE.
pub fn split_window_structure(closes: &[f64], lookback: usize) -> MarketStructure {
    let window = &closes[closes.len().saturating_sub(lookback)..];
    let half = window.len() / 2;
    if half < 2 {
        return MarketStructure::Range;
    }

    let (older, recent) = window.split_at(half);
    let older_low = older.iter().copied().fold(f64::INFINITY, f64::min);
    let older_high = older.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let recent_low = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let recent_high = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if recent_low > older_low && recent_high > older_high {
        MarketStructure::Bullish
    } else if recent_low < older_low && recent_high < older_high {
        MarketStructure::Bearish
    } else {
        MarketStructure::Range
    }
}

/// Direction-aware structure score.
///
/// Structure only counts toward agreement when the higher timeframe leans
/// the same way; it counts against when they conflict, and a neutral
/// timeframe or range structure contributes nothing.
pub fn direction_aware_score(structure: MarketStructure, htf_bias: Bias) -> i32 {
    let raw = structure.raw_score();
    if raw == 0 || htf_bias == Bias::Neutral {
        return 0;
    }

    let agrees = (raw > 0 && htf_bias == Bias::Bull) || (raw < 0 && htf_bias == Bias::Bear);
    if agrees {
        1
    } else {
        -1
    }
}
