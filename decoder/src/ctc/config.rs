use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

pub const DEFAULT_ALPHABET: &str = "ACGT";

/// Largest alphabet a [`Symbol`](crate::ctc::Symbol) index can address.
pub const MAX_ALPHABET_LEN: usize = u8::MAX as usize + 1;

/// Prefix of the environment variables read by [`DecoderConfig::from_env`].
pub const ENV_PREFIX: &str = "RADIAN_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Hypotheses retained per timestep.
    pub beam_width: usize,
    /// Number of trailing symbols used to condition the language model.
    pub context_length: usize,
    /// Fusion requires the language model entropy to be below this.
    pub rna_entropy_threshold: f64,
    /// Fusion requires the signal entropy to be above this.
    pub signal_entropy_threshold: f64,
    /// One character per non-blank channel, in channel order.
    pub alphabet: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            beam_width: 6,
            context_length: 8,
            rna_entropy_threshold: 1.0,
            signal_entropy_threshold: 0.5,
            alphabet: DEFAULT_ALPHABET.to_string(),
        }
    }
}

impl DecoderConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(ENV_PREFIX);
        config
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        log::debug!("Loaded decoder config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, prefix: &str) {
        let parse_env = |suffix: &str| std::env::var(format!("{prefix}{suffix}")).ok();
        let apply = |suffix: &str, target: &mut f64| {
            if let Some(v) = parse_env(suffix).and_then(|s| s.parse().ok()) {
                *target = v;
            }
        };

        apply("RNA_THRESHOLD", &mut self.rna_entropy_threshold);
        apply("SIGNAL_THRESHOLD", &mut self.signal_entropy_threshold);

        if let Some(v) = parse_env("BEAM_WIDTH").and_then(|s| s.parse::<usize>().ok()) {
            self.beam_width = v;
        }
        if let Some(v) = parse_env("CONTEXT_LENGTH").and_then(|s| s.parse().ok()) {
            self.context_length = v;
        }
        if let Some(v) = parse_env("ALPHABET") {
            let v = v.trim();
            if !v.is_empty() {
                self.alphabet = v.to_string();
            }
        }
    }

    pub fn alphabet_chars(&self) -> Vec<char> {
        self.alphabet.chars().collect()
    }

    /// Checks the configuration against a posterior matrix with `channels`
    /// columns (alphabet plus blank). Called before any timestep is decoded.
    pub fn validate(&self, channels: usize) -> Result<(), DecodeError> {
        if self.beam_width == 0 {
            return Err(DecodeError::InvalidConfig(
                "beam_width must be at least 1".into(),
            ));
        }
        if !self.rna_entropy_threshold.is_finite() || !self.signal_entropy_threshold.is_finite()
        {
            return Err(DecodeError::InvalidConfig(
                "entropy thresholds must be finite".into(),
            ));
        }
        if channels < 2 {
            return Err(DecodeError::InvalidConfig(format!(
                "posteriors need at least one symbol and a blank, got {channels} channels"
            )));
        }
        let alphabet = self.alphabet.chars().count();
        if alphabet > MAX_ALPHABET_LEN {
            return Err(DecodeError::InvalidConfig(format!(
                "alphabet of {alphabet} symbols exceeds {MAX_ALPHABET_LEN}"
            )));
        }
        if alphabet + 1 != channels {
            return Err(DecodeError::AlphabetMismatch { alphabet, channels });
        }
        Ok(())
    }
}
