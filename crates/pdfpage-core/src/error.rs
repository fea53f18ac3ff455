//! Error types for pdfpage.
//!
//! Provides [`PageError`], the single error type surfaced by every page
//! operation. Every error is returned synchronously as the result of the
//! call that produced it; nothing is retried internally.

use std::fmt;

/// Fatal error for a page operation.
///
/// The first three variants form the page-level taxonomy; the remaining
/// ones come from the document collaborator that opens and parses PDF files.
#[derive(Debug, Clone, PartialEq)]
pub enum PageError {
    /// A caller-supplied argument is out of range (bad DPI, bad dimensions,
    /// undersized buffers). Always fixable by the caller.
    InvalidParameter(String),
    /// A page index outside `1..=page_count` was requested.
    NotFound {
        /// The requested 1-based index.
        index: usize,
        /// Number of pages in the document.
        page_count: usize,
    },
    /// Surface allocation or the underlying draw primitive failed.
    RenderFailure(String),
    /// The PDF structure or a content stream could not be parsed.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
}

impl PageError {
    /// Shorthand for [`PageError::InvalidParameter`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        PageError::InvalidParameter(msg.into())
    }

    /// Shorthand for [`PageError::RenderFailure`].
    pub fn render(msg: impl Into<String>) -> Self {
        PageError::RenderFailure(msg.into())
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            PageError::NotFound { index, page_count } => write!(
                f,
                "page {index} not found (document has {page_count} pages, numbered from 1)"
            ),
            PageError::RenderFailure(msg) => write!(f, "render failure: {msg}"),
            PageError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PageError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PageError {}

impl From<std::io::Error> for PageError {
    fn from(err: std::io::Error) -> Self {
        PageError::IoError(err.to_string())
    }
}
