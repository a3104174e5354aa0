//! Indicator series over close prices.
//!
//! Every function returns a series aligned to its input: one output per
//! input element, with `f64::NAN` filling the warm-up prefix where the
//! indicator is not yet defined. Callers read values through [`value_at`]
//! so short or still-warming series degrade to `None` instead of panicking.

pub mod ema;
pub mod rsi;
pub mod stoch_rsi;

pub use ema::ema;
pub use rsi::rsi;
pub use stoch_rsi::{stoch_rsi, StochRsi};

/// Read a series at `offset` candles from the end (1 = most recent).
///
/// Returns `None` when the series is too short or the value is still NaN.
pub fn value_at(series: &[f64], offset: usize) -> Option<f64> {
    if offset == 0 || series.len() < offset {
        return None;
    }
    let value = series[series.len() - offset];
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
