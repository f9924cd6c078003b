use std::time::Instant;

use ndarray::ArrayView2;

use crate::ctc::config::DecoderConfig;
use crate::error::DecodeError;
use crate::lm::LanguageModel;

pub(crate) mod search;
pub(crate) mod session;
pub(crate) mod state;

pub use search::decode_greedy;
pub use session::{DecodeStats, DecoderSession};
pub use state::*;

/// Result of decoding one read.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub sequence: String,
    pub labeling: Labeling,
    /// Log-probability of `labeling` as accumulated by the search.
    pub log_prob: f64,
}

impl DecoderSession<'_> {
    /// Runs beam search over a `[T, C]` posterior matrix whose last column is
    /// the CTC blank. The entropy cache and statistics start fresh each call.
    pub fn decode(&mut self, posteriors: &ArrayView2<f32>) -> Result<Decoded, DecodeError> {
        let (timesteps, channels) = posteriors.dim();
        self.config.validate(channels)?;
        self.reset();

        let beam_width = self.config.beam_width;
        let decode_start = Instant::now();
        log::debug!(
            "Decoding (Beam={}, lm={}) timesteps={}",
            beam_width,
            self.has_language_model(),
            timesteps
        );

        let final_state = search::decode_beam(self, posteriors, beam_width)?;
        let (labeling, log_prob) = final_state
            .best()
            .map(|(labeling, entry)| (labeling.clone(), entry.prob_total))
            .unwrap_or_default();

        let stats = self.stats();
        log::debug!(
            "decode completed in {:?} (timesteps: {}, symbols: {}, lm lookups: {}, unmodeled: {}, fused: {}, cached contexts: {})",
            decode_start.elapsed(),
            stats.timesteps,
            labeling.len(),
            stats.lm_lookups,
            stats.unmodeled_contexts,
            stats.fused_steps,
            stats.contexts_cached
        );

        Ok(Decoded {
            sequence: self.render(&labeling),
            labeling,
            log_prob,
        })
    }
}

/// Decodes one posterior matrix with a fresh session.
pub fn decode(
    posteriors: &ArrayView2<f32>,
    config: &DecoderConfig,
    language_model: Option<&dyn LanguageModel>,
) -> Result<Decoded, DecodeError> {
    DecoderSession::new(config, language_model).decode(posteriors)
}
