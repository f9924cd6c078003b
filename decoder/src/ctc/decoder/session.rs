use std::borrow::Cow;

use crate::ctc::config::DecoderConfig;
use crate::error::DecodeError;
use crate::lm::{fuse, lookup_and_score, EntropyCache, LanguageModel};

use super::state::Symbol;

/// Counters collected over one decode call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    pub timesteps: usize,
    pub lm_lookups: usize,
    pub unmodeled_contexts: usize,
    pub fused_steps: usize,
    pub entropy_cache_hits: usize,
    pub contexts_cached: usize,
}

/// Per-call decoding state: the configuration, an optional read-only
/// language model handle and the entropy cache.
pub struct DecoderSession<'a> {
    pub(crate) config: &'a DecoderConfig,
    pub(crate) language_model: Option<&'a dyn LanguageModel>,
    pub(crate) entropy_cache: EntropyCache,
    pub(crate) alphabet: Vec<char>,
    pub(crate) stats: DecodeStats,
}

impl<'a> DecoderSession<'a> {
    pub fn new(config: &'a DecoderConfig, language_model: Option<&'a dyn LanguageModel>) -> Self {
        Self {
            config,
            language_model,
            entropy_cache: EntropyCache::new(),
            alphabet: config.alphabet_chars(),
            stats: DecodeStats::default(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        self.config
    }

    pub fn has_language_model(&self) -> bool {
        self.language_model.is_some()
    }

    pub fn entropy_cache(&self) -> &EntropyCache {
        &self.entropy_cache
    }

    /// Statistics of the most recent decode call.
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            entropy_cache_hits: self.entropy_cache.hits(),
            contexts_cached: self.entropy_cache.len(),
            ..self.stats
        }
    }

    pub(crate) fn reset(&mut self) {
        self.entropy_cache = EntropyCache::new();
        self.stats = DecodeStats::default();
    }

    /// Distribution to score a transition with: the language-model fused row
    /// when the model covers `context` and the entropy gate opens, otherwise
    /// `row` itself.
    pub(crate) fn step_distribution<'r>(
        &mut self,
        row: &'r [f64],
        signal_entropy: f64,
        context: &[Symbol],
    ) -> Result<Cow<'r, [f64]>, DecodeError> {
        let Some(model) = self.language_model else {
            return Ok(Cow::Borrowed(row));
        };
        self.stats.lm_lookups += 1;

        let symbols = row.len().saturating_sub(1);
        let Some(scored) = lookup_and_score(context, model, &mut self.entropy_cache, symbols)?
        else {
            self.stats.unmodeled_contexts += 1;
            return Ok(Cow::Borrowed(row));
        };

        let dist = fuse(
            row,
            &scored.distribution,
            signal_entropy,
            scored.entropy,
            self.config.rna_entropy_threshold,
            self.config.signal_entropy_threshold,
        );
        if matches!(dist, Cow::Owned(_)) {
            self.stats.fused_steps += 1;
        }
        Ok(dist)
    }

    pub(crate) fn render(&self, labeling: &[Symbol]) -> String {
        labeling
            .iter()
            .filter_map(|&s| self.alphabet.get(s as usize))
            .collect()
    }
}
