//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for the backend error and converts it into
//! [`PageError`] at the crate boundary.

use pdfpage_core::PageError;
use thiserror::Error;

/// Error type for PDF parsing backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PageError),
}

impl From<BackendError> for PageError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PageError::ParseError(msg),
            BackendError::Io(e) => PageError::IoError(e.to_string()),
            BackendError::Interpreter(msg) => PageError::ParseError(format!("interpreter: {msg}")),
            BackendError::Core(e) => e,
        }
    }
}
