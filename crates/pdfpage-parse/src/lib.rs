//! pdfpage-parse: PDF parsing backend and content stream interpreter.
//!
//! Loads documents with lopdf, resolves page boxes and resources, and
//! interprets page content into char, path, and image events. Depends on
//! pdfpage-core for shared data types.

pub mod backend;
pub mod color_space;
pub mod error;
pub mod font_metrics;
pub mod handler;
pub mod image_decode;
mod interpreter;
mod interpreter_state;
pub mod lopdf_backend;
mod tokenizer;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use handler::{CharEvent, ContentHandler, ImageData, ImageEvent, PaintOp, PathEvent};
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use pdfpage_core;
