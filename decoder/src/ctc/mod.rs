pub mod config;
pub mod decoder;
pub mod posteriors;
pub mod prob;

pub use config::{DecoderConfig, DEFAULT_ALPHABET, ENV_PREFIX};
pub use decoder::{
    decode, decode_greedy, BeamEntry, BeamField, BeamState, DecodeStats, Decoded, DecoderSession,
    Labeling, Symbol,
};
pub use posteriors::{signal_entropies, validate_posteriors, DEFAULT_ROW_TOLERANCE};
