//! Exponential Moving Average (EMA) series.

/// EMA over closes, seeded with the SMA of the first `length` values.
///
/// The first `length - 1` entries are NaN.
pub fn ema(closes: &[f64], length: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if length == 0 || closes.len() < length {
        return out;
    }

    let multiplier = 2.0 / (length as f64 + 1.0);

    // First EMA is SMA
    let sma: f64 = closes[..length].iter().sum::<f64>() / length as f64;
    out[length - 1] = sma;

    let mut ema = sma;
    for i in length..closes.len() {
        ema = (closes[i] - ema) * multiplier + ema;
        out[i] = ema;
    }

    out
}
