use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use radian_decoder_lib::ctc::ENV_PREFIX;
use radian_decoder_lib::DecoderConfig;

/// Decode basecaller posteriors into RNA sequences.
#[derive(Parser, Debug)]
#[command(name = "radian", version, about)]
pub struct Args {
    /// JSON file of reads: {"reads": [{"id": "...", "posteriors": [[...], ...]}]}
    pub input: PathBuf,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Decoder config JSON; RADIAN_* environment variables apply on top
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// k-mer RNA language model table (JSON)
    #[arg(long)]
    pub lm: Option<PathBuf>,

    #[arg(long)]
    pub beam_width: Option<usize>,

    #[arg(long)]
    pub context_length: Option<usize>,

    #[arg(long)]
    pub rna_threshold: Option<f64>,

    #[arg(long)]
    pub signal_threshold: Option<f64>,

    #[arg(long)]
    pub alphabet: Option<String>,

    /// Best-path decoding instead of beam search
    #[arg(long)]
    pub greedy: bool,

    /// Reject reads whose rows are not probability distributions
    #[arg(long)]
    pub validate: bool,

    /// Emit FASTA instead of tab-separated id/sequence lines
    #[arg(long)]
    pub fasta: bool,
}

impl Args {
    /// Config file (or defaults), then environment, then flags.
    pub fn decoder_config(&self) -> Result<DecoderConfig> {
        let mut config = match &self.config {
            Some(path) => DecoderConfig::from_json_path(path)
                .with_context(|| format!("loading decoder config {}", path.display()))?,
            None => DecoderConfig::default(),
        };
        config.apply_env_overrides(ENV_PREFIX);

        if let Some(v) = self.beam_width {
            config.beam_width = v;
        }
        if let Some(v) = self.context_length {
            config.context_length = v;
        }
        if let Some(v) = self.rna_threshold {
            config.rna_entropy_threshold = v;
        }
        if let Some(v) = self.signal_threshold {
            config.signal_entropy_threshold = v;
        }
        if let Some(v) = &self.alphabet {
            config.alphabet = v.clone();
        }

        config
            .validate(config.alphabet.chars().count() + 1)
            .context("invalid decoder configuration")?;
        Ok(config)
    }
}
