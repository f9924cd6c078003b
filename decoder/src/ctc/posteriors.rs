use ndarray::ArrayView2;

use crate::ctc::prob::{entropy, normalize};
use crate::error::DecodeError;

/// Allowed deviation of a row sum from one.
pub const DEFAULT_ROW_TOLERANCE: f32 = 1e-3;

/// Checks that every row is a categorical distribution: finite, non-negative
/// and summing to one within `tolerance`.
///
/// Decoding does not require this, but garbage in gives garbage out without
/// any other signal.
pub fn validate_posteriors(
    posteriors: &ArrayView2<f32>,
    tolerance: f32,
) -> Result<(), DecodeError> {
    for (timestep, row) in posteriors.outer_iter().enumerate() {
        if let Some(p) = row.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(DecodeError::MalformedInput {
                timestep,
                reason: format!("invalid probability {p}"),
            });
        }
        let sum: f32 = row.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(DecodeError::MalformedInput {
                timestep,
                reason: format!("row sums to {sum}"),
            });
        }
    }
    Ok(())
}

/// Entropy of each row's non-blank channels after renormalization.
///
/// The blank channel (last column) is excluded so that the value measures how
/// unsure the network is about *which* symbol, not *whether* one is emitted.
pub fn signal_entropies(posteriors: &ArrayView2<f32>) -> Vec<f64> {
    posteriors
        .outer_iter()
        .map(|row| {
            let bases: Vec<f64> = row
                .iter()
                .take(row.len().saturating_sub(1))
                .map(|&p| f64::from(p))
                .collect();
            entropy(&normalize(&bases))
        })
        .collect()
}
