//! Error types for skinmaker.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while producing a skin.
#[derive(Debug, Error)]
pub enum SkinError {
    /// The generation API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Converting a generated image to the output format failed.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// A local pipeline stage failed.
    #[error("Image processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// A blocking image task panicked or was cancelled.
    #[error("Image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Recording or replaying a cassette failed.
    #[error("Cassette error: {0}")]
    Cassette(String),

    /// No API key configured for the provider.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },
}

/// Pipeline stage that produced a [`ProcessingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decode, cover-fit and re-encode of the input.
    Normalize,
    /// Color modulation and re-fit.
    Stylize,
    /// Persisting the final image to the requested output path.
    Output,
}

impl Stage {
    /// Lowercase stage tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Stylize => "stylize",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of a [`ProcessingError`].
#[derive(Debug, Error)]
pub enum ProcessingCause {
    /// Input could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[source] image::ImageError),
    /// Output could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] image::ImageError),
    /// Disk read or write failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

/// A failed pipeline stage, tagged with the stage and carrying its cause.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct ProcessingError {
    /// Stage that failed.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub cause: ProcessingCause,
}

impl ProcessingError {
    pub(crate) fn new(stage: Stage, cause: ProcessingCause) -> Self {
        Self { stage, cause }
    }

    pub(crate) fn decode(stage: Stage, err: image::ImageError) -> Self {
        // The image crate reports unreadable files as IoError; keep them as I/O.
        match err {
            image::ImageError::IoError(io) => Self::new(stage, ProcessingCause::Io(io)),
            other => Self::new(stage, ProcessingCause::Decode(other)),
        }
    }

    pub(crate) fn encode(stage: Stage, err: image::ImageError) -> Self {
        Self::new(stage, ProcessingCause::Encode(err))
    }

    pub(crate) fn io(stage: Stage, err: std::io::Error) -> Self {
        Self::new(stage, ProcessingCause::Io(err))
    }
}
