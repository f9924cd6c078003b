//! CTC beam search decoding of basecaller posteriors, with entropy-gated
//! fusion of an RNA language model.

pub mod ctc;
pub mod engine;
pub mod error;
pub mod lm;

pub use ctc::{decode, decode_greedy, Decoded, DecoderConfig, DecoderSession};
pub use engine::{Basecaller, SignalModel};
pub use error::DecodeError;
pub use lm::{LanguageModel, LmError, TableModel};
