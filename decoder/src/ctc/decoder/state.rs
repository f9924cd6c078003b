use std::cmp::Ordering;
use std::collections::HashMap;

use crate::ctc::prob::{log_add, LOG_ONE, LOG_ZERO};

/// Index of a non-blank channel.
pub type Symbol = u8;

/// A decoded prefix in CTC canonical form: no blanks, repeats already merged.
pub type Labeling = Vec<Symbol>;

/// Log-probabilities of every alignment that collapses to one labeling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamEntry {
    pub prob_total: f64,
    pub prob_non_blank: f64,
    pub prob_blank: f64,
}

impl Default for BeamEntry {
    fn default() -> Self {
        Self {
            prob_total: LOG_ZERO,
            prob_non_blank: LOG_ZERO,
            prob_blank: LOG_ZERO,
        }
    }
}

impl BeamEntry {
    /// The empty labeling before the first timestep.
    pub fn initial() -> Self {
        Self {
            prob_total: LOG_ONE,
            prob_non_blank: LOG_ZERO,
            prob_blank: LOG_ONE,
        }
    }

    pub fn get(&self, field: BeamField) -> f64 {
        match field {
            BeamField::Total => self.prob_total,
            BeamField::NonBlank => self.prob_non_blank,
            BeamField::Blank => self.prob_blank,
        }
    }

    fn get_mut(&mut self, field: BeamField) -> &mut f64 {
        match field {
            BeamField::Total => &mut self.prob_total,
            BeamField::NonBlank => &mut self.prob_non_blank,
            BeamField::Blank => &mut self.prob_blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamField {
    Total,
    NonBlank,
    Blank,
}

/// All hypotheses alive at one timestep.
#[derive(Debug, Clone, Default)]
pub struct BeamState {
    entries: HashMap<Labeling, BeamEntry>,
}

impl BeamState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// The canonical CTC start state: only the empty labeling, ending in blank
    /// with probability one.
    pub fn initial() -> Self {
        let mut state = Self::with_capacity(1);
        state.entries.insert(Vec::new(), BeamEntry::initial());
        state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, labeling: &[Symbol]) -> Option<&BeamEntry> {
        self.entries.get(labeling)
    }

    pub fn get_or_default(&self, labeling: &[Symbol]) -> BeamEntry {
        self.entries.get(labeling).copied().unwrap_or_default()
    }

    /// Log-domain accumulation: `field = log_add(field, value)`, inserting the
    /// default entry first when `labeling` has not been seen at this timestep.
    pub fn accumulate(&mut self, labeling: &[Symbol], field: BeamField, value: f64) {
        if !self.entries.contains_key(labeling) {
            self.entries.insert(labeling.to_vec(), BeamEntry::default());
        }
        if let Some(entry) = self.entries.get_mut(labeling) {
            let slot = entry.get_mut(field);
            *slot = log_add(*slot, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Labeling, &BeamEntry)> {
        self.entries.iter()
    }

    /// Up to `k` labelings, best `prob_total` first.
    ///
    /// Equal totals are ordered shorter labeling first, then by symbol order,
    /// so the result never depends on hash iteration order. NaN totals rank
    /// below everything else.
    pub fn top_k(&self, k: usize) -> Vec<&Labeling> {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|(la, a), (lb, b)| rank(la, a, lb, b));
        ranked.truncate(k);
        ranked.into_iter().map(|(labeling, _)| labeling).collect()
    }

    pub fn best(&self) -> Option<(&Labeling, &BeamEntry)> {
        self.entries
            .iter()
            .min_by(|(la, a), (lb, b)| rank(la, a, lb, b))
    }
}

fn rank_key(entry: &BeamEntry) -> f64 {
    if entry.prob_total.is_nan() {
        LOG_ZERO
    } else {
        entry.prob_total
    }
}

fn rank(la: &Labeling, a: &BeamEntry, lb: &Labeling, b: &BeamEntry) -> Ordering {
    rank_key(b)
        .total_cmp(&rank_key(a))
        .then_with(|| la.len().cmp(&lb.len()))
        .then_with(|| la.cmp(lb))
}
