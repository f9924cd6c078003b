use std::borrow::Cow;

use ndarray::ArrayView2;

use crate::ctc::config::DecoderConfig;
use crate::ctc::posteriors::signal_entropies;
use crate::ctc::prob::{log_add, safe_log, LOG_ONE, LOG_ZERO};
use crate::error::DecodeError;

use super::session::DecoderSession;
use super::state::{BeamField, BeamState, Labeling, Symbol};
use super::Decoded;

/// Language model context for the copy transition: the `len` symbols before
/// the labeling's last one.
pub(crate) fn context_before_last(labeling: &[Symbol], len: usize) -> &[Symbol] {
    let end = labeling.len().saturating_sub(1);
    &labeling[end.saturating_sub(len)..end]
}

/// Language model context for the extend transition: the last `len` symbols.
pub(crate) fn trailing_context(labeling: &[Symbol], len: usize) -> &[Symbol] {
    &labeling[labeling.len().saturating_sub(len)..]
}

/// Builds the beam state for one timestep from the previous one.
pub(crate) fn advance(
    session: &mut DecoderSession,
    last: &BeamState,
    row: &[f64],
    signal_entropy: f64,
    beam_width: usize,
) -> Result<BeamState, DecodeError> {
    let blank_idx = row.len() - 1;
    let context_length = session.config.context_length;
    let use_lm = session.has_language_model();

    let visited = last.len().min(beam_width);
    let mut curr = BeamState::with_capacity(visited.saturating_mul(row.len()));
    let mut extended = Labeling::new();

    for labeling in last.top_k(beam_width) {
        let prev = last.get_or_default(labeling);

        // copy: the labeling survives this timestep unchanged
        let pr_non_blank = match labeling.last() {
            Some(&tail) => {
                let dist = if use_lm && labeling.len() > context_length {
                    session.step_distribution(
                        row,
                        signal_entropy,
                        context_before_last(labeling, context_length),
                    )?
                } else {
                    Cow::Borrowed(row)
                };
                prev.prob_non_blank + safe_log(dist[tail as usize])
            }
            None => LOG_ZERO,
        };
        let pr_blank = prev.prob_total + safe_log(row[blank_idx]);

        curr.accumulate(labeling, BeamField::NonBlank, pr_non_blank);
        curr.accumulate(labeling, BeamField::Blank, pr_blank);
        curr.accumulate(labeling, BeamField::Total, log_add(pr_blank, pr_non_blank));

        // extend: append every non-blank symbol
        let dist = if use_lm && labeling.len() >= context_length {
            session.step_distribution(
                row,
                signal_entropy,
                trailing_context(labeling, context_length),
            )?
        } else {
            Cow::Borrowed(row)
        };

        for (c, &p) in dist[..blank_idx].iter().enumerate() {
            let symbol = c as Symbol;
            // a repeated symbol only counts as new after a blank
            let base = if labeling.last() == Some(&symbol) {
                prev.prob_blank
            } else {
                prev.prob_total
            };
            let pr = base + safe_log(p);

            extended.clear();
            extended.extend_from_slice(labeling);
            extended.push(symbol);
            curr.accumulate(&extended, BeamField::NonBlank, pr);
            curr.accumulate(&extended, BeamField::Total, pr);
        }
    }

    Ok(curr)
}

pub(crate) fn decode_beam(
    session: &mut DecoderSession,
    posteriors: &ArrayView2<f32>,
    beam_width: usize,
) -> Result<BeamState, DecodeError> {
    let timesteps = posteriors.nrows();
    let entropies = if session.has_language_model() {
        signal_entropies(posteriors)
    } else {
        vec![0.0; timesteps]
    };

    let mut last = BeamState::initial();
    let mut row = Vec::with_capacity(posteriors.ncols());
    for (frame, signal_entropy) in posteriors.outer_iter().zip(entropies) {
        row.clear();
        row.extend(frame.iter().map(|&p| f64::from(p)));
        last = advance(session, &last, &row, signal_entropy, beam_width)?;
    }
    session.stats.timesteps = timesteps;
    Ok(last)
}

/// Best-path decoding: the most likely channel at every timestep, with
/// repeats merged and blanks dropped.
pub fn decode_greedy(
    posteriors: &ArrayView2<f32>,
    config: &DecoderConfig,
) -> Result<Decoded, DecodeError> {
    let channels = posteriors.ncols();
    config.validate(channels)?;
    let alphabet = config.alphabet_chars();
    let blank_idx = channels - 1;

    let mut labeling = Labeling::new();
    let mut log_prob = LOG_ONE;
    let mut last_idx = blank_idx;

    for frame in posteriors.outer_iter() {
        let mut best_idx = blank_idx;
        let mut best_prob = f32::NEG_INFINITY;
        for (idx, &p) in frame.iter().enumerate() {
            if p > best_prob {
                best_prob = p;
                best_idx = idx;
            }
        }
        log_prob += safe_log(f64::from(best_prob));
        if best_idx != blank_idx && best_idx != last_idx {
            labeling.push(best_idx as Symbol);
        }
        last_idx = best_idx;
    }

    Ok(Decoded {
        sequence: labeling.iter().map(|&s| alphabet[s as usize]).collect(),
        labeling,
        log_prob,
    })
}
