//! Position-based trailing mean.
//!
//! The window counts records, not calendar days: a gap in dates does not widen
//! the window. Positions before the window fills have no value.

/// Trailing mean over `window` values ending at each position.
///
/// `out[i]` is `None` for `i + 1 < window`, otherwise the mean of
/// `values[i + 1 - window ..= i]`. A `window` of 0 yields all `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for (offset, slice) in values.windows(window).enumerate() {
        let sum: f64 = slice.iter().sum();
        out[offset + window - 1] = Some(sum / window as f64);
    }
    out
}

/// Mean of the last `n` values, or `None` if fewer than `n` exist.
pub fn tail_mean(values: &[f64], n: usize) -> Option<f64> {
    if n == 0 || values.len() < n {
        return None;
    }
    let tail = &values[values.len() - n..];
    Some(tail.iter().sum::<f64>() / n as f64)
}
