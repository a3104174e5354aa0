//! Stochastic RSI: the stochastic oscillator applied to an RSI series.

use super::rsi::rsi;

/// Smoothed %K and %D series, aligned to the input closes.
#[derive(Debug, Clone)]
pub struct StochRsi {
    /// Stochastic of RSI, SMA-smoothed over `smooth_k`.
    pub k: Vec<f64>,
    /// SMA of %K over `smooth_d`.
    pub d: Vec<f64>,
}

/// Stochastic RSI over closes, 0-100.
///
/// %K = (RSI - lowest RSI) / (highest RSI - lowest RSI) * 100 over a window
/// of `length` RSI values, then smoothed. A flat RSI window reads 50.
pub fn stoch_rsi(closes: &[f64], length: usize, smooth_k: usize, smooth_d: usize) -> StochRsi {
    let rsi_series = rsi(closes, length);
    let mut raw = vec![f64::NAN; closes.len()];

    if length > 0 {
        for i in 0..closes.len() {
            if i + 1 < length {
                continue;
            }
            let window = &rsi_series[i + 1 - length..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }

            let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
            let highest = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            raw[i] = if highest != lowest {
                ((rsi_series[i] - lowest) / (highest - lowest)) * 100.0
            } else {
                50.0
            };
        }
    }

    let k = rolling_mean(&raw, smooth_k);
    let d = rolling_mean(&k, smooth_d);
    StochRsi { k, d }
}

/// Simple moving average that stays NaN until its window is fully defined.
fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    if window == 0 {
        return out;
    }

    for i in 0..series.len() {
        if i + 1 < window {
            continue;
        }
        let slice = &series[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().sum::<f64>() / window as f64;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choppy_closes(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| {
                let wiggle = if i % 2 == 0 { 2.0 } else { -2.0 };
                100.0 + i as f64 * 0.1 + wiggle
            })
            .collect()
    }

    #[test]
    fn test_stoch_rsi_warmup() {
        // RSI defined from index 14, stochastic needs a 14-value window, %K a
        // 3-value window: first defined %K lands at index 29.
        let output = stoch_rsi(&choppy_closes(60), 14, 3, 3);
        assert!(output.k[..29].iter().all(|v| v.is_nan()));
        assert!(!output.k[29].is_nan());
        assert!(output.d[..31].iter().all(|v| v.is_nan()));
        assert!(!output.d[31].is_nan());
    }

    #[test]
    fn test_stoch_rsi_range() {
        let output = stoch_rsi(&choppy_closes(80), 14, 3, 3);
        for value in output.k.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(value), "%K out of range: {}", value);
        }
    }

    #[test]
    fn test_flat_rsi_window_reads_midline() {
        // A strict uptrend pins RSI at 100, so the stochastic window is flat.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 1.5).collect();
        let output = stoch_rsi(&closes, 14, 3, 3);
        assert_eq!(*output.k.last().unwrap(), 50.0);
    }

    #[test]
    fn test_recent_strength_pushes_k_to_top() {
        // Chop, then a strong run: the final RSI is its window's maximum.
        let mut closes = choppy_closes(50);
        let mut last = *closes.last().unwrap();
        for _ in 0..10 {
            last += 5.0;
            closes.push(last);
        }

        let output = stoch_rsi(&closes, 14, 3, 3);
        assert!(*output.k.last().unwrap() > 80.0);
    }

    #[test]
    fn test_short_series_is_all_nan() {
        let output = stoch_rsi(&choppy_closes(20), 14, 3, 3);
        assert!(output.k.iter().all(|v| v.is_nan()));
        assert!(output.d.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rolling_mean_identity_window() {
        let series = [f64::NAN, 2.0, 4.0];
        let smoothed = rolling_mean(&series, 1);
        assert!(smoothed[0].is_nan());
        assert_eq!(smoothed[1], 2.0);
        assert_eq!(smoothed[2], 4.0);
    }
}
