//! pdfpage: render a single PDF page to pixels, locate text on it, and list
//! its image placements.
//!
//! This is the public API facade. It re-exports types from pdfpage-core and
//! uses pdfpage-parse for PDF reading and interpretation.
//!
//! # Architecture
//!
//! - **pdfpage-core**: geometry, the pixel compositor, options, errors, search
//! - **pdfpage-parse**: lopdf backend and content stream interpreter
//! - **pdfpage** (this crate): the [`PageHandle`] capability, the tiny-skia
//!   [`Canvas`], [`PageRenderer`], the text locator, and [`Document`]
//!
//! # Example
//!
//! ```ignore
//! let doc = pdfpage::Document::open_file("report.pdf")?;
//! let page = doc.open_page(1)?;
//! let image = pdfpage::render(&page, 150.0)?;
//! let hits = pdfpage::locate::find(&page, "total")?;
//! ```

pub mod canvas;
pub mod locate;
pub mod page;
pub mod pdf;
pub mod render;
pub mod synthetic;

pub use canvas::Canvas;
pub use locate::{find, find_by, list_images};
pub use page::PageHandle;
pub use pdf::{Document, Pages, PdfPage};
pub use render::{PageRenderer, RenderResult, render};
pub use synthetic::SyntheticPage;

pub use pdfpage_core;
pub use pdfpage_core::{
    AlphaMode, Char, Color, Ctm, FillRule, ImagePlacement, PageError, PathSegment, Point, Rect,
    RenderOptions, SearchMatch, SearchOptions,
};
pub use pdfpage_parse;
