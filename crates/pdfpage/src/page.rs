//! The page capability consumed by the renderer and the locators.

use pdfpage_core::{PageError, Rect};

use crate::canvas::Canvas;

/// A single page that can report its size, draw itself, list its image
/// placements, and find text.
///
/// All geometry is in page-point space: origin at the bottom-left corner,
/// y increasing upward, 72 units per inch.
pub trait PageHandle {
    /// Page width and height in points.
    fn dimensions(&self) -> (f64, f64);

    /// Draw the page onto `canvas`. The canvas already carries the scale
    /// and the y flip.
    ///
    /// # Errors
    ///
    /// Any error aborts the render; the renderer reports it as
    /// [`PageError::RenderFailure`].
    fn draw(&self, canvas: &mut Canvas<'_>) -> Result<(), PageError>;

    /// Image placement rectangles in content order.
    fn image_mappings(&self) -> Vec<Rect>;

    /// Rectangles of every occurrence of `query`, in content order.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the search primitive fails.
    fn find_text(&self, query: &str) -> Result<Vec<Rect>, PageError>;

    /// 1-based page number within its document.
    fn index(&self) -> usize {
        1
    }

    /// Visible region of the page. Defaults to the full page.
    fn crop_box(&self) -> Rect {
        let (w, h) = self.dimensions();
        Rect::from_size(w, h)
    }
}
