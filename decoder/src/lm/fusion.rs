use std::borrow::Cow;

/// Fusion happens only when the language model is confident and the signal
/// model is not.
#[inline]
pub fn should_fuse(
    signal_entropy: f64,
    rna_entropy: f64,
    rna_threshold: f64,
    signal_threshold: f64,
) -> bool {
    rna_entropy < rna_threshold && signal_entropy > signal_threshold
}

/// Returns the blended distribution when [`should_fuse`] holds, otherwise
/// `signal` untouched.
pub fn fuse<'s>(
    signal: &'s [f64],
    rna: &[f64],
    signal_entropy: f64,
    rna_entropy: f64,
    rna_threshold: f64,
    signal_threshold: f64,
) -> Cow<'s, [f64]> {
    if should_fuse(signal_entropy, rna_entropy, rna_threshold, signal_threshold) {
        combine_dists(signal, rna)
    } else {
        Cow::Borrowed(signal)
    }
}

/// Averages the non-blank shape of `signal` with `rna`.
///
/// The signal's non-blank mass and its blank value are kept exactly, so only
/// the relative weights of the symbols change. `signal` must end with the
/// blank channel and `rna` must cover the remaining channels. With no
/// non-blank mass there is no shape to blend and `signal` is returned as is.
pub fn combine_dists<'s>(signal: &'s [f64], rna: &[f64]) -> Cow<'s, [f64]> {
    let Some((blank, bases)) = signal.split_last() else {
        return Cow::Borrowed(signal);
    };
    let mass: f64 = bases.iter().sum();
    if mass == 0.0 {
        return Cow::Borrowed(signal);
    }

    let mut fused: Vec<f64> = bases
        .iter()
        .zip(rna)
        .map(|(&s, &r)| (s / mass + r) / 2.0 * mass)
        .collect();
    fused.push(*blank);
    Cow::Owned(fused)
}
