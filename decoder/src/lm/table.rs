use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Instant;

use serde::Deserialize;

use crate::ctc::config::DEFAULT_ALPHABET;
use crate::ctc::prob::normalize;
use crate::ctc::{Labeling, Symbol};
use crate::error::DecodeError;

use super::{LanguageModel, LmError};

/// On-disk form: contexts are strings over the alphabet.
#[derive(Debug, Deserialize)]
struct TableFile {
    context_length: usize,
    #[serde(default = "default_alphabet")]
    alphabet: String,
    entries: BTreeMap<String, Vec<f64>>,
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}

/// A k-mer table language model: every context of exactly `context_length`
/// symbols maps to a distribution over the next symbol.
#[derive(Debug, Clone)]
pub struct TableModel {
    context_length: usize,
    alphabet: Vec<char>,
    table: HashMap<Labeling, Vec<f64>>,
}

impl TableModel {
    /// Builds a model from symbol-indexed entries. Distributions are
    /// normalized; zero-sum distributions are rejected.
    pub fn from_entries<I>(
        context_length: usize,
        alphabet: &str,
        entries: I,
    ) -> Result<Self, LmError>
    where
        I: IntoIterator<Item = (Labeling, Vec<f64>)>,
    {
        let alphabet: Vec<char> = alphabet.chars().collect();
        let mut table = HashMap::new();
        for (context, dist) in entries {
            if context.len() != context_length {
                return Err(LmError::InvalidTable(format!(
                    "context {:?} has length {}, expected {}",
                    context,
                    context.len(),
                    context_length
                )));
            }
            if let Some(&s) = context.iter().find(|&&s| s as usize >= alphabet.len()) {
                return Err(LmError::InvalidTable(format!(
                    "symbol {s} is outside the {}-letter alphabet",
                    alphabet.len()
                )));
            }
            if dist.len() != alphabet.len() {
                return Err(LmError::DistributionWidth {
                    expected: alphabet.len(),
                    actual: dist.len(),
                });
            }
            if dist.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(LmError::InvalidTable(format!(
                    "context {context:?} has a negative or non-finite probability"
                )));
            }
            if dist.iter().sum::<f64>() == 0.0 {
                return Err(LmError::InvalidTable(format!(
                    "context {context:?} has an all-zero distribution"
                )));
            }
            table.insert(context, normalize(&dist));
        }

        Ok(Self {
            context_length,
            alphabet,
            table,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DecodeError> {
        let file: TableFile = serde_json::from_str(raw)?;
        let alphabet: Vec<char> = file.alphabet.chars().collect();
        let mut entries = Vec::with_capacity(file.entries.len());
        for (context, dist) in file.entries {
            let symbols = context
                .chars()
                .map(|c| {
                    alphabet
                        .iter()
                        .position(|&a| a == c)
                        .map(|i| i as Symbol)
                        .ok_or_else(|| {
                            LmError::InvalidTable(format!(
                                "context '{context}' uses '{c}', not in alphabet '{}'",
                                file.alphabet
                            ))
                        })
                })
                .collect::<Result<Labeling, _>>()?;
            entries.push((symbols, dist));
        }
        Ok(Self::from_entries(
            file.context_length,
            &file.alphabet,
            entries,
        )?)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let start = Instant::now();
        let raw = std::fs::read_to_string(path.as_ref())?;
        let model = Self::from_json_str(&raw)?;
        log::info!(
            "Loaded {}-mer RNA model with {} contexts from {} in {:?}",
            model.context_length,
            model.len(),
            path.as_ref().display(),
            start.elapsed()
        );
        Ok(model)
    }

    pub fn context_length(&self) -> usize {
        self.context_length
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl LanguageModel for TableModel {
    fn next_distribution(&self, context: &[Symbol]) -> Result<Cow<'_, [f64]>, LmError> {
        if context.len() != self.context_length {
            return Err(LmError::UnmodeledContext(context.to_vec()));
        }
        self.table
            .get(context)
            .map(|dist| Cow::Borrowed(dist.as_slice()))
            .ok_or_else(|| LmError::UnmodeledContext(context.to_vec()))
    }
}
