//! Top-level PDF document type and the lopdf-backed page.

use pdfpage_core::{
    Char, Color, ImagePlacement, PageError, Rect, RenderOptions, SearchMatch, SearchOptions,
    placement_from_ctm, search_chars,
};
use pdfpage_parse::{
    CharEvent, ContentHandler, ImageEvent, LopdfBackend, LopdfDocument, PaintOp, PathEvent,
    PdfBackend,
};
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::page::PageHandle;

/// Fill used where an image's samples could not be decoded.
const PLACEHOLDER: Color = Color::rgb(0.75, 0.75, 0.75);

/// A PDF document opened for page access.
///
/// ```ignore
/// let doc = Document::open(&bytes)?;
/// let page = doc.open_page(1)?;
/// let image = pdfpage::render(&page, 150.0)?;
/// ```
pub struct Document {
    doc: LopdfDocument,
    options: RenderOptions,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("pages", &self.page_count())
            .field("options", &self.options)
            .finish()
    }
}

impl Document {
    /// Open a PDF document from bytes with default options.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ParseError`] if the bytes are not a readable,
    /// unencrypted PDF.
    pub fn open(bytes: &[u8]) -> Result<Self, PageError> {
        Self::open_with_options(bytes, RenderOptions::default())
    }

    /// Open a PDF document from bytes. `options` governs how pages are
    /// interpreted (form nesting depth).
    ///
    /// # Errors
    ///
    /// See [`Document::open`].
    pub fn open_with_options(bytes: &[u8], options: RenderOptions) -> Result<Self, PageError> {
        let doc = LopdfBackend::open(bytes).map_err(PageError::from)?;
        Ok(Self { doc, options })
    }

    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::IoError`] if the file cannot be read, otherwise
    /// as [`Document::open`].
    pub fn open_file(path: impl AsRef<std::path::Path>) -> Result<Self, PageError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes)
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Open the page at 1-based `index` and interpret its content.
    ///
    /// # Errors
    ///
    /// - [`PageError::NotFound`] if `index` is 0 or greater than
    ///   [`page_count`](Document::page_count).
    /// - [`PageError::ParseError`] if the page tree or content streams are
    ///   malformed.
    pub fn open_page(&self, index: usize) -> Result<PdfPage, PageError> {
        let page_count = self.page_count();
        if index == 0 || index > page_count {
            return Err(PageError::NotFound { index, page_count });
        }
        let page = LopdfBackend::get_page(&self.doc, index - 1).map_err(PageError::from)?;

        let media_box = LopdfBackend::page_media_box(&self.doc, &page).map_err(PageError::from)?;
        let crop_box = LopdfBackend::page_crop_box(&self.doc, &page).map_err(PageError::from)?;
        let rotation = LopdfBackend::page_rotate(&self.doc, &page).map_err(PageError::from)?;

        let mut handler = CollectingHandler::default();
        LopdfBackend::interpret_page(&self.doc, &page, &mut handler, &self.options)
            .map_err(PageError::from)?;

        for message in &handler.warnings {
            warn!(page = index, "{message}");
        }
        debug!(
            page = index,
            chars = handler.chars.len(),
            items = handler.items.len(),
            "page interpreted"
        );

        // Events are reported relative to the MediaBox origin; the crop box
        // is shifted the same way.
        let crop_box = crop_box
            .map(|cb| {
                Rect::new(
                    cb.x1 - media_box.x1,
                    cb.y1 - media_box.y1,
                    cb.x2 - media_box.x1,
                    cb.y2 - media_box.y1,
                )
            })
            .unwrap_or_else(|| Rect::from_size(media_box.width(), media_box.height()));

        let images = handler
            .items
            .iter()
            .filter_map(|item| match item {
                DisplayItem::Image(event) => Some(ImagePlacement {
                    name: event.name.clone(),
                    rect: placement_from_ctm(&event.ctm),
                    src_width: event.width,
                    src_height: event.height,
                    color_space: event.colorspace.clone(),
                }),
                DisplayItem::Path(_) => None,
            })
            .collect();

        Ok(PdfPage {
            index,
            width: media_box.width(),
            height: media_box.height(),
            crop_box,
            rotation,
            chars: handler.chars.into_iter().map(char_from_event).collect(),
            items: handler.items,
            images,
            warnings: handler.warnings,
        })
    }

    /// Iterate over all pages in order, interpreting each on demand.
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            doc: self,
            next: 1,
            count: self.page_count(),
        }
    }
}

/// Iterator over the pages of a [`Document`], created by
/// [`Document::pages`].
#[derive(Debug)]
pub struct Pages<'a> {
    doc: &'a Document,
    next: usize,
    count: usize,
}

impl Iterator for Pages<'_> {
    type Item = Result<PdfPage, PageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.count {
            return None;
        }
        let result = self.doc.open_page(self.next);
        self.next += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count + 1 - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pages<'_> {}

/// A painted element, in content order.
#[derive(Debug, Clone)]
enum DisplayItem {
    Path(PathEvent),
    Image(ImageEvent),
}

#[derive(Default)]
struct CollectingHandler {
    chars: Vec<CharEvent>,
    items: Vec<DisplayItem>,
    warnings: Vec<String>,
}

impl ContentHandler for CollectingHandler {
    fn on_char(&mut self, event: CharEvent) {
        self.chars.push(event);
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        self.items.push(DisplayItem::Path(event));
    }

    fn on_image(&mut self, event: ImageEvent) {
        self.items.push(DisplayItem::Image(event));
    }

    fn on_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

fn char_from_event(event: CharEvent) -> Char {
    Char::new(event.text, event.rect, event.font_size)
}

/// A page of a [`Document`], fully interpreted and immutable.
///
/// Coordinates are page points with the origin at the MediaBox's
/// bottom-left corner.
#[derive(Debug, Clone)]
pub struct PdfPage {
    index: usize,
    width: f64,
    height: f64,
    crop_box: Rect,
    rotation: i32,
    chars: Vec<Char>,
    items: Vec<DisplayItem>,
    images: Vec<ImagePlacement>,
    warnings: Vec<String>,
}

impl PdfPage {
    /// `/Rotate` in degrees, normalized to `0..360`. Reported only; the
    /// renderer draws the unrotated page.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Characters in content order.
    pub fn chars(&self) -> &[Char] {
        &self.chars
    }

    /// Image placements with their source metadata, in content order.
    pub fn images(&self) -> &[ImagePlacement] {
        &self.images
    }

    /// Non-fatal problems found while interpreting the page.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Concatenated text of all characters.
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.text.as_str()).collect()
    }

    /// Search with explicit options, returning full matches.
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidParameter`] if `options.regex` is set and the
    /// query is not a valid pattern.
    pub fn find_text_with(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchMatch>, PageError> {
        search_chars(&self.chars, query, options)
    }
}

impl PageHandle for PdfPage {
    fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn draw(&self, canvas: &mut Canvas<'_>) -> Result<(), PageError> {
        for item in &self.items {
            match item {
                DisplayItem::Path(path) => {
                    if matches!(path.paint_op, PaintOp::Fill | PaintOp::FillAndStroke) {
                        canvas.fill_path(&path.segments, &path.ctm, path.fill_color, path.fill_rule)?;
                    }
                    if matches!(path.paint_op, PaintOp::Stroke | PaintOp::FillAndStroke) {
                        canvas.stroke_path(
                            &path.segments,
                            &path.ctm,
                            path.stroke_color,
                            path.line_width,
                        )?;
                    }
                }
                DisplayItem::Image(image) => match &image.data {
                    Some(data) => canvas.draw_image(data.width, data.height, &data.rgba, &image.ctm)?,
                    None => canvas.fill_rect(placement_from_ctm(&image.ctm), PLACEHOLDER)?,
                },
            }
        }
        Ok(())
    }

    fn image_mappings(&self) -> Vec<Rect> {
        self.images.iter().map(|img| img.rect).collect()
    }

    fn find_text(&self, query: &str) -> Result<Vec<Rect>, PageError> {
        Ok(self
            .find_text_with(query, &SearchOptions::default())?
            .into_iter()
            .map(|m| m.rect)
            .collect())
    }

    fn index(&self) -> usize {
        self.index
    }

    fn crop_box(&self) -> Rect {
        self.crop_box
    }
}
