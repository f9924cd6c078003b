use std::collections::HashMap;

use approx::assert_relative_eq;
use ndarray::Array2;
use radian_decoder_lib::ctc::Labeling;
use radian_decoder_lib::{
    decode, decode_greedy, DecodeError, DecoderConfig, DecoderSession, LanguageModel,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn matrix(rows: &[&[f32]]) -> Array2<f32> {
    let channels = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), channels), flat).unwrap()
}

fn config(alphabet: &str, beam_width: usize) -> DecoderConfig {
    DecoderConfig {
        beam_width,
        alphabet: alphabet.to_string(),
        ..Default::default()
    }
}

/// Deterministic row-stochastic matrix without pulling in an RNG.
fn pseudo_random_matrix(timesteps: usize, channels: usize, seed: u64) -> Array2<f32> {
    let mut x = seed;
    let mut m = Array2::<f32>::zeros((timesteps, channels));
    for mut row in m.rows_mut() {
        for v in row.iter_mut() {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            *v = ((x >> 33) % 1000 + 1) as f32;
        }
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    m
}

#[test]
fn single_timestep_picks_the_most_likely_symbol() {
    init_logging();
    let m = matrix(&[&[0.6, 0.3, 0.1]]);
    let out = decode(&m.view(), &config("AB", 10), None).unwrap();
    assert_eq!(out.sequence, "A");
    assert_eq!(out.labeling, vec![0]);
    assert_relative_eq!(out.log_prob, 0.6f64.ln(), epsilon = 1e-6);
}

#[test]
fn repeated_symbol_without_blank_collapses() {
    let m = matrix(&[&[0.1, 0.8, 0.1], &[0.1, 0.8, 0.1]]);
    let out = decode(&m.view(), &config("AB", 10), None).unwrap();
    assert_eq!(out.sequence, "B");
    // B-B, B-blank and blank-B
    assert_relative_eq!(out.log_prob.exp(), 0.8, epsilon = 1e-6);
}

#[test]
fn blank_between_repeats_keeps_both() {
    let m = matrix(&[&[0.05, 0.9, 0.05], &[0.05, 0.05, 0.9], &[0.05, 0.9, 0.05]]);
    let out = decode(&m.view(), &config("AB", 10), None).unwrap();
    assert_eq!(out.sequence, "BB");
}

#[test]
fn empty_matrix_decodes_to_empty_sequence() {
    let m = Array2::<f32>::zeros((0, 5));
    let out = decode(&m.view(), &DecoderConfig::default(), None).unwrap();
    assert_eq!(out.sequence, "");
    assert!(out.labeling.is_empty());
    assert_eq!(out.log_prob, 0.0);
}

#[test]
fn all_blank_rows_decode_to_empty_sequence() {
    let m = matrix(&[&[0.0, 0.0, 1.0], &[0.0, 0.0, 1.0], &[0.0, 0.0, 1.0]]);
    let out = decode(&m.view(), &config("AB", 4), None).unwrap();
    assert_eq!(out.sequence, "");
    assert_eq!(out.log_prob, 0.0);
}

#[test]
fn beam_width_one_matches_greedy_decoding() {
    let m = matrix(&[
        &[0.7, 0.2, 0.1],
        &[0.1, 0.2, 0.7],
        &[0.1, 0.8, 0.1],
        &[0.6, 0.3, 0.1],
    ]);
    let cfg = config("AB", 1);
    let beam = decode(&m.view(), &cfg, None).unwrap();
    let greedy = decode_greedy(&m.view(), &cfg).unwrap();
    assert_eq!(beam.sequence, "ABA");
    assert_eq!(greedy.sequence, "ABA");
    assert_eq!(beam.labeling, greedy.labeling);
}

#[test]
fn greedy_collapses_repeats_and_drops_blanks() {
    let m = matrix(&[
        &[0.1, 0.8, 0.1],
        &[0.1, 0.8, 0.1],
        &[0.1, 0.1, 0.8],
        &[0.1, 0.8, 0.1],
        &[0.7, 0.2, 0.1],
    ]);
    let out = decode_greedy(&m.view(), &config("AB", 1)).unwrap();
    assert_eq!(out.sequence, "BBA");
    assert_relative_eq!(
        out.log_prob,
        (0.8f64 * 0.8 * 0.8 * 0.8 * 0.7).ln(),
        epsilon = 1e-5
    );
}

#[test]
fn decoding_is_deterministic() {
    let m = pseudo_random_matrix(40, 5, 7);
    let cfg = config("ACGT", 5);
    let first = decode(&m.view(), &cfg, None).unwrap();
    for _ in 0..3 {
        assert_eq!(decode(&m.view(), &cfg, None).unwrap(), first);
    }
}

#[test]
fn wider_beams_never_beat_the_exhaustive_search() {
    // 4 timesteps over 2 symbols stay well under 64 labelings per step.
    // Below that, pruning can keep a different set of prefixes at each
    // step, so a narrower beam is only bounded by the exhaustive result and
    // the width ordering is checked once no prefix is pruned.
    for seed in 1..6 {
        let m = pseudo_random_matrix(4, 3, seed);
        let exhaustive = decode(&m.view(), &config("AB", 64), None).unwrap();
        let mut previous_best = f64::NEG_INFINITY;
        for width in [1, 2, 4, 8, 16, 64] {
            let out = decode(&m.view(), &config("AB", width), None).unwrap();
            assert!(
                out.log_prob <= exhaustive.log_prob + 1e-9,
                "seed {seed} width {width}: {} > {}",
                out.log_prob,
                exhaustive.log_prob
            );
            if width >= 16 {
                assert!(out.log_prob >= previous_best - 1e-9);
            }
            previous_best = out.log_prob;
        }
    }
}

#[test]
fn huge_beam_width_behaves_like_an_unpruned_search() {
    let m = matrix(&[&[0.1, 0.8, 0.1], &[0.1, 0.8, 0.1]]);
    let out = decode(&m.view(), &config("AB", usize::MAX), None).unwrap();
    assert_eq!(out.sequence, "B");

    for seed in 1..4 {
        let m = pseudo_random_matrix(6, 3, seed);
        let unbounded = decode(&m.view(), &config("AB", usize::MAX), None).unwrap();
        let wide = decode(&m.view(), &config("AB", 64), None).unwrap();
        assert_eq!(unbounded.labeling, wide.labeling, "seed {seed}");
        assert_relative_eq!(unbounded.log_prob, wide.log_prob, epsilon = 1e-12);
    }
}

#[test]
fn zero_beam_width_is_rejected_before_decoding() {
    let m = matrix(&[&[0.6, 0.3, 0.1]]);
    let err = decode(&m.view(), &config("AB", 0), None).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidConfig(_)));
}

#[test]
fn alphabet_must_match_channel_count() {
    let m = matrix(&[&[0.6, 0.3, 0.1]]);
    let err = decode(&m.view(), &config("ACGT", 4), None).unwrap_err();
    match err {
        DecodeError::AlphabetMismatch { alphabet, channels } => {
            assert_eq!(alphabet, 4);
            assert_eq!(channels, 3);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

/// After `A`, the model is sure the next base is `A` again.
fn a_follows_a() -> HashMap<Labeling, Vec<f64>> {
    let mut table = HashMap::new();
    table.insert(vec![0], vec![0.95, 0.05]);
    table.insert(vec![1], vec![0.5, 0.5]);
    table
}

fn lm_config() -> DecoderConfig {
    DecoderConfig {
        beam_width: 10,
        context_length: 1,
        rna_entropy_threshold: 0.5,
        signal_entropy_threshold: 0.3,
        alphabet: "AB".to_string(),
    }
}

#[test]
fn confident_language_model_overrides_uncertain_signal() {
    init_logging();
    let m = matrix(&[&[0.9, 0.05, 0.05], &[0.05, 0.05, 0.9], &[0.44, 0.46, 0.10]]);
    let cfg = lm_config();

    let plain = decode(&m.view(), &cfg, None).unwrap();
    assert_eq!(plain.sequence, "AB");

    let table = a_follows_a();
    let mut session = DecoderSession::new(&cfg, Some(&table));
    let fused = session.decode(&m.view()).unwrap();
    assert_eq!(fused.sequence, "AA");

    let stats = session.stats();
    assert_eq!(stats.timesteps, 3);
    assert!(stats.fused_steps > 0);
    assert!(stats.lm_lookups >= stats.fused_steps);
    assert!(stats.entropy_cache_hits > 0);
}

#[test]
fn empty_context_is_used_when_context_length_is_zero() {
    let mut table: HashMap<Labeling, Vec<f64>> = HashMap::new();
    table.insert(vec![], vec![0.95, 0.05]);
    let cfg = DecoderConfig {
        context_length: 0,
        ..lm_config()
    };
    let m = matrix(&[&[0.44, 0.46, 0.10]]);

    assert_eq!(decode(&m.view(), &cfg, None).unwrap().sequence, "B");
    assert_eq!(decode(&m.view(), &cfg, Some(&table)).unwrap().sequence, "A");
}

#[test]
fn unmodeled_contexts_fall_back_to_the_signal() {
    let empty: HashMap<Labeling, Vec<f64>> = HashMap::new();
    let m = pseudo_random_matrix(12, 3, 3);
    let cfg = lm_config();

    let plain = decode(&m.view(), &cfg, None).unwrap();
    let mut session = DecoderSession::new(&cfg, Some(&empty));
    let with_lm = session.decode(&m.view()).unwrap();

    assert_eq!(with_lm, plain);
    let stats = session.stats();
    assert!(stats.unmodeled_contexts > 0);
    assert_eq!(stats.unmodeled_contexts, stats.lm_lookups);
    assert_eq!(stats.fused_steps, 0);
    assert_eq!(stats.contexts_cached, 0);
}

#[test]
fn entropy_cache_starts_fresh_for_each_call() {
    let table = a_follows_a();
    let cfg = lm_config();
    let m = pseudo_random_matrix(10, 3, 11);
    let mut session = DecoderSession::new(&cfg, Some(&table));

    let first = session.decode(&m.view()).unwrap();
    let first_stats = session.stats();
    let second = session.decode(&m.view()).unwrap();

    assert_eq!(first, second);
    assert_eq!(session.stats(), first_stats);
    assert!(session.entropy_cache().len() <= 2);
}

#[test]
fn shared_language_model_across_threads() {
    let table = a_follows_a();
    let model: &dyn LanguageModel = &table;
    let cfg = &lm_config();
    let reads: Vec<Array2<f32>> = (0..4).map(|s| pseudo_random_matrix(16, 3, s)).collect();

    let sequential: Vec<String> = reads
        .iter()
        .map(|m| decode(&m.view(), cfg, Some(model)).unwrap().sequence)
        .collect();

    let parallel: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = reads
            .iter()
            .map(|m| scope.spawn(move || decode(&m.view(), cfg, Some(model)).unwrap().sequence))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, sequential);
}
