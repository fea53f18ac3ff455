//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts document loading, page
//! lookup, page boxes, and content interpretation.

use pdfpage_core::{PageError, Rect, RenderOptions};

use crate::handler::ContentHandler;

/// Trait abstracting PDF parsing operations.
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let media_box = MyBackend::page_media_box(&doc, &page)?;
/// MyBackend::interpret_page(&doc, &page, &mut handler, &options)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`PageError`].
    type Error: std::error::Error + Into<PageError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable, unencrypted PDF.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// The page's MediaBox, inherited from the page tree when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if no MediaBox is found or it is malformed.
    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<Rect, Self::Error>;

    /// The CropBox on the page or inherited from an ancestor, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the CropBox is present but malformed.
    fn page_crop_box(doc: &Self::Document, page: &Self::Page) -> Result<Option<Rect>, Self::Error>;

    /// The page's `/Rotate` value in degrees (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the page dictionary cannot be read.
    fn page_rotate(doc: &Self::Document, page: &Self::Page) -> Result<i32, Self::Error>;

    /// Interpret the page's content streams, emitting events to `handler`.
    ///
    /// # Errors
    ///
    /// Returns an error if a content stream cannot be read or decoded.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        options: &RenderOptions,
    ) -> Result<(), Self::Error>;
}
