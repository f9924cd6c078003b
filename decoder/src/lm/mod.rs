//! RNA language model capability and the pieces that feed it into decoding.

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

use crate::ctc::{Labeling, Symbol};

pub mod bridge;
pub mod fusion;
pub mod table;

pub use bridge::{lookup_and_score, EntropyCache, Scored};
pub use fusion::{combine_dists, fuse, should_fuse};
pub use table::TableModel;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LmError {
    #[error("No distribution for context {0:?}")]
    UnmodeledContext(Labeling),

    #[error("Distribution has {actual} entries, expected {expected}")]
    DistributionWidth { expected: usize, actual: usize },

    #[error("Invalid language model table: {0}")]
    InvalidTable(String),
}

/// Next-symbol distributions conditioned on a fixed-length context.
///
/// Implementations are read-only during decoding and may be shared between
/// concurrent decode calls.
pub trait LanguageModel: Send + Sync {
    /// Distribution over the non-blank symbols following `context`.
    ///
    /// Return [`LmError::UnmodeledContext`] for contexts the model does not
    /// cover; the decoder then falls back to the signal distribution.
    fn next_distribution(&self, context: &[Symbol]) -> Result<Cow<'_, [f64]>, LmError>;
}

impl LanguageModel for HashMap<Labeling, Vec<f64>> {
    fn next_distribution(&self, context: &[Symbol]) -> Result<Cow<'_, [f64]>, LmError> {
        self.get(context)
            .map(|dist| Cow::Borrowed(dist.as_slice()))
            .ok_or_else(|| LmError::UnmodeledContext(context.to_vec()))
    }
}
