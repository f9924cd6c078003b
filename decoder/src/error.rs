use thiserror::Error;

use crate::lm::LmError;

/// Errors raised by a decode call or by the components it is assembled from.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    #[error("Alphabet has {alphabet} symbols but the posteriors have {channels} channels")]
    AlphabetMismatch { alphabet: usize, channels: usize },

    #[error("Malformed posteriors at timestep {timestep}: {reason}")]
    MalformedInput { timestep: usize, reason: String },

    #[error("Language model: {0}")]
    LanguageModel(#[from] LmError),

    #[error("Signal model failed: {0}")]
    Signal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ndarray shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl DecodeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) | Self::AlphabetMismatch { .. } => {
                "The decoder settings do not match the model output. Check the beam width and alphabet."
            }
            Self::MalformedInput { .. } | Self::Shape(_) => {
                "The basecaller output is not a valid probability matrix."
            }
            Self::LanguageModel(_) => "The RNA language model could not be used for this read.",
            Self::Signal(_) => "The basecaller network failed to produce posteriors.",
            Self::Io(_) | Self::Json(_) => {
                "Could not read or parse the input files. Check the paths and their contents."
            }
        }
    }
}
