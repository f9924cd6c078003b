use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use radian_decoder_lib::{DecodeError, Decoded};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ReadBatch {
    pub reads: Vec<ReadPosteriors>,
}

#[derive(Deserialize, Debug)]
pub struct ReadPosteriors {
    pub id: String,
    pub posteriors: Vec<Vec<f32>>,
}

impl ReadPosteriors {
    /// Packs the rows into a `[T, C]` matrix. An empty read gets `channels`
    /// columns so it still passes the alphabet check.
    pub fn to_array(&self, channels: usize) -> Result<Array2<f32>, DecodeError> {
        let Some(first) = self.posteriors.first() else {
            return Ok(Array2::zeros((0, channels)));
        };
        let width = first.len();
        if let Some(t) = self.posteriors.iter().position(|row| row.len() != width) {
            return Err(DecodeError::MalformedInput {
                timestep: t,
                reason: format!(
                    "row has {} channels, expected {}",
                    self.posteriors[t].len(),
                    width
                ),
            });
        }
        let flat: Vec<f32> = self.posteriors.iter().flatten().copied().collect();
        Ok(Array2::from_shape_vec((self.posteriors.len(), width), flat)?)
    }
}

pub fn load_batch(path: &Path) -> Result<ReadBatch> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading posteriors from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn write_record<W: Write>(
    out: &mut W,
    id: &str,
    decoded: &Decoded,
    fasta: bool,
) -> std::io::Result<()> {
    if fasta {
        writeln!(out, ">{id}")?;
        writeln!(out, "{}", decoded.sequence)
    } else {
        writeln!(out, "{id}\t{}", decoded.sequence)
    }
}
