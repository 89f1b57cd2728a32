//! Error types for the topic-model engine.
//!
//! Codes are stable and grouped by category:
//! - 10-19: configuration and manifest errors
//! - 20-29: corpus/embedding/assignment load errors
//! - 30-39: state-consistency errors
//! - 40-49: numerical errors
//! - 60-69: I/O errors

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for training, inference, and evaluation runs.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    // Load errors (20-29)
    #[error(transparent)]
    Corpus(#[from] tm_corpus::CorpusError),

    // Consistency errors (30-39)
    #[error("corpus and assignment file are not consistent: {0}")]
    Inconsistent(String),

    // Numerical errors (40-49)
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code, usable as a process exit code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidManifest(_) => 11,
            Error::Corpus(_) => 20,
            Error::Inconsistent(_) => 30,
            Error::NumericalInstability(_) => 40,
            Error::Io(_) => 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::Inconsistent("x".into()).code(), 30);
        assert_eq!(Error::NumericalInstability("x".into()).code(), 40);
    }

    #[test]
    fn corpus_errors_convert() {
        let err: Error = tm_corpus::CorpusError::MissingVector {
            word: "w".to_string(),
        }
        .into();
        assert_eq!(err.code(), 20);
        assert!(err.to_string().contains("\"w\""));
    }
}
