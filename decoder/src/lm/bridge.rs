use std::borrow::Cow;
use std::collections::HashMap;

use crate::ctc::prob::entropy;
use crate::ctc::{Labeling, Symbol};

use super::{LanguageModel, LmError};

/// Entropy of the language model distribution, memoized per context.
///
/// Lives for a single decode call and only ever grows.
#[derive(Debug, Default)]
pub struct EntropyCache {
    entries: HashMap<Labeling, f64>,
    hits: usize,
}

impl EntropyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn get(&self, context: &[Symbol]) -> Option<f64> {
        self.entries.get(context).copied()
    }

    pub fn get_or_compute(&mut self, context: &[Symbol], dist: &[f64]) -> f64 {
        if let Some(&h) = self.entries.get(context) {
            self.hits += 1;
            return h;
        }
        let h = entropy(dist);
        self.entries.insert(context.to_vec(), h);
        h
    }
}

/// A language model distribution together with its entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<'m> {
    pub distribution: Cow<'m, [f64]>,
    pub entropy: f64,
}

/// Looks up the model distribution for `context` and scores its entropy.
///
/// `Ok(None)` means the model has no entry for this context and the caller
/// should keep the signal distribution. A distribution whose width is not
/// `symbols` is an error.
pub fn lookup_and_score<'m>(
    context: &[Symbol],
    model: &'m dyn LanguageModel,
    cache: &mut EntropyCache,
    symbols: usize,
) -> Result<Option<Scored<'m>>, LmError> {
    let distribution = match model.next_distribution(context) {
        Ok(dist) => dist,
        Err(LmError::UnmodeledContext(_)) => {
            log::trace!("No language model entry for context {:?}", context);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if distribution.len() != symbols {
        return Err(LmError::DistributionWidth {
            expected: symbols,
            actual: distribution.len(),
        });
    }
    let entropy = cache.get_or_compute(context, &distribution);
    Ok(Some(Scored {
        distribution,
        entropy,
    }))
}
