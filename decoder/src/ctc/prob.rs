//! Log-domain probability helpers.
//!
//! Everything here works in natural-log units. Zero probabilities are routine
//! in CTC posteriors, so none of these functions trap on them: `ln(0)` is
//! represented by [`LOG_ZERO`] and propagates through [`log_add`].

/// `ln(0)`.
pub const LOG_ZERO: f64 = f64::NEG_INFINITY;

/// `ln(1)`.
pub const LOG_ONE: f64 = 0.0;

/// Natural log that maps an exact zero to [`LOG_ZERO`].
#[inline]
pub fn safe_log(x: f64) -> f64 {
    if x == 0.0 {
        LOG_ZERO
    } else {
        x.ln()
    }
}

/// Scales `dist` so it sums to one. A distribution whose sum is exactly zero
/// is returned as is.
pub fn normalize(dist: &[f64]) -> Vec<f64> {
    let sum: f64 = dist.iter().sum();
    if sum == 0.0 {
        return dist.to_vec();
    }
    dist.iter().map(|p| p / sum).collect()
}

/// Shannon entropy in nats. Zero-probability events contribute nothing.
pub fn entropy(dist: &[f64]) -> f64 {
    let h: f64 = dist
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum();
    // one-hot rows give -0.0
    h.max(0.0)
}

/// `ln(exp(a) + exp(b))` without overflow.
#[inline]
pub fn log_add(a: f64, b: f64) -> f64 {
    if a == LOG_ZERO {
        return b;
    }
    if b == LOG_ZERO {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}
