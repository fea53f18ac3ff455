//! A fixed-content page for exercising the renderer and locators without
//! a PDF engine.

use pdfpage_core::{Color, PageError, Rect};

use crate::canvas::Canvas;
use crate::page::PageHandle;

/// Page whose content is a list of solid rectangles, with preset search
/// hits and image placements.
///
/// ```
/// use pdfpage::{Color, Rect, SyntheticPage, locate};
///
/// let page = SyntheticPage::new(612.0, 792.0)
///     .with_fill(Rect::new(0.0, 0.0, 306.0, 396.0), Color::BLACK)
///     .with_text_hits("total", vec![Rect::new(36.0, 36.0, 72.0, 72.0)]);
/// let hits = locate::find(&page, "total").unwrap();
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticPage {
    width: f64,
    height: f64,
    index: usize,
    fills: Vec<(Rect, Color)>,
    hits: Vec<(String, Vec<Rect>)>,
    images: Vec<Rect>,
    draw_error: Option<String>,
    search_error: Option<String>,
}

impl SyntheticPage {
    /// Blank page of `width` × `height` points.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            index: 1,
            fills: Vec::new(),
            hits: Vec::new(),
            images: Vec::new(),
            draw_error: None,
            search_error: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Add a solid rectangle, painted in insertion order.
    pub fn with_fill(mut self, rect: Rect, color: Color) -> Self {
        self.fills.push((rect, color));
        self
    }

    /// Rectangles returned when `find_text` is called with exactly `query`.
    pub fn with_text_hits(mut self, query: impl Into<String>, rects: Vec<Rect>) -> Self {
        self.hits.push((query.into(), rects));
        self
    }

    /// Add an image placement.
    pub fn with_image(mut self, rect: Rect) -> Self {
        self.images.push(rect);
        self
    }

    /// Make every `draw` call fail with `message`.
    pub fn failing_draw(mut self, message: impl Into<String>) -> Self {
        self.draw_error = Some(message.into());
        self
    }

    /// Make every `find_text` call fail with `message`.
    pub fn failing_search(mut self, message: impl Into<String>) -> Self {
        self.search_error = Some(message.into());
        self
    }
}

impl PageHandle for SyntheticPage {
    fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn draw(&self, canvas: &mut Canvas<'_>) -> Result<(), PageError> {
        if let Some(msg) = &self.draw_error {
            return Err(PageError::render(msg.clone()));
        }
        for (rect, color) in &self.fills {
            canvas.fill_rect(*rect, *color)?;
        }
        Ok(())
    }

    fn image_mappings(&self) -> Vec<Rect> {
        self.images.clone()
    }

    fn find_text(&self, query: &str) -> Result<Vec<Rect>, PageError> {
        if let Some(msg) = &self.search_error {
            return Err(PageError::RenderFailure(msg.clone()));
        }
        Ok(self
            .hits
            .iter()
            .filter(|(q, _)| q == query)
            .flat_map(|(_, rects)| rects.iter().copied())
            .collect())
    }

    fn index(&self) -> usize {
        self.index
    }
}
