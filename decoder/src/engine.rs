//! High-level basecalling facade: signal model posteriors in, sequence out.

use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array2, ArrayView2};

use crate::ctc::{validate_posteriors, DecodeStats, Decoded, DecoderConfig, DecoderSession};
use crate::error::DecodeError;
use crate::lm::LanguageModel;

/// The neural network side of basecalling: raw signal to a `[T, C]` matrix
/// of per-timestep posteriors, blank last.
pub trait SignalModel: Send {
    fn posteriors(&mut self, signal: &[f32]) -> Result<Array2<f32>, DecodeError>;
}

pub struct Basecaller {
    signal_model: Box<dyn SignalModel>,
    language_model: Option<Arc<dyn LanguageModel>>,
    config: DecoderConfig,
    validate_input: bool,
    last_stats: DecodeStats,
}

impl Basecaller {
    pub fn new(signal_model: Box<dyn SignalModel>, config: DecoderConfig) -> Self {
        Self {
            signal_model,
            language_model: None,
            config,
            validate_input: false,
            last_stats: DecodeStats::default(),
        }
    }

    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Reject posterior rows that are not probability distributions instead
    /// of decoding them.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_input = enabled;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn last_stats(&self) -> DecodeStats {
        self.last_stats
    }

    pub fn basecall(&mut self, signal: &[f32]) -> Result<Decoded, DecodeError> {
        if signal.is_empty() {
            log::warn!("Basecall requested for an empty signal");
        }

        let start = Instant::now();
        let posteriors = self.signal_model.posteriors(signal)?;
        log::debug!(
            "Signal model produced {:?} posteriors from {} samples in {:?}",
            posteriors.dim(),
            signal.len(),
            start.elapsed()
        );

        self.basecall_posteriors(&posteriors.view())
    }

    pub fn basecall_posteriors(
        &mut self,
        posteriors: &ArrayView2<f32>,
    ) -> Result<Decoded, DecodeError> {
        if self.validate_input {
            validate_posteriors(posteriors, crate::ctc::DEFAULT_ROW_TOLERANCE)?;
        }

        let start = Instant::now();
        let mut session = DecoderSession::new(&self.config, self.language_model.as_deref());
        let result = session.decode(posteriors).map_err(|err| {
            log::error!("Decoding failed: {}", err);
            err
        })?;
        self.last_stats = session.stats();

        log::info!(
            "Basecalled {} timesteps into {} bases in {:?}",
            posteriors.nrows(),
            result.sequence.len(),
            start.elapsed()
        );
        Ok(result)
    }
}
