//! Relative Strength Index (RSI) series, Wilder-smoothed.

/// RSI over closes, 0-100. The first `length` entries are NaN.
///
/// Seeded with simple averages of the first `length` gains and losses, then
/// smoothed with `avg = (avg * (length - 1) + change) / length`.
pub fn rsi(closes: &[f64], length: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if length == 0 || closes.len() < length + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut avg_gain: f64 = gains[..length].iter().sum::<f64>() / length as f64;
    let mut avg_loss: f64 = losses[..length].iter().sum::<f64>() / length as f64;
    out[length] = rsi_point(avg_gain, avg_loss);

    for i in length..gains.len() {
        avg_gain = (avg_gain * (length - 1) as f64 + gains[i]) / length as f64;
        avg_loss = (avg_loss * (length - 1) as f64 + losses[i]) / length as f64;
        out[i + 1] = rsi_point(avg_gain, avg_loss);
    }

    out
}

fn rsi_point(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
