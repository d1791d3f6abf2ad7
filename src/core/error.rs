//! Error types for the gapped k-mer SVM pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GksvmError {
    #[error("Unknown kernel type '{0}': must be 'linear', 'gakco', or 'rbf'")]
    UnknownKernel(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Window length g = {g} exceeds the shortest sequence in {corpus} (length {min_len})")]
    WindowTooLong {
        g: usize,
        min_len: usize,
        corpus: String,
    },

    #[error("A test corpus must be provided for kernel type '{0}'")]
    MissingTestCorpus(&'static str),

    #[error("Dictionary size mismatch: train corpus has {train}, test corpus has {test}")]
    DictionaryMismatch { train: usize, test: usize },

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Failed to allocate {what} ({cells} cells)")]
    Resource { what: &'static str, cells: usize },

    #[error("Solver failed: {0}")]
    Solver(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GksvmError {
    /// True for failures detected before any heavy computation starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GksvmError::UnknownKernel(_)
                | GksvmError::InvalidParameter(_)
                | GksvmError::WindowTooLong { .. }
                | GksvmError::MissingTestCorpus(_)
                | GksvmError::DictionaryMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GksvmError>;
