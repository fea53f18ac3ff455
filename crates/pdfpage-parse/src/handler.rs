//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter calls handler methods as it processes page content; the
//! handler decides what to keep (display list for drawing, chars for
//! search, image placements).

use pdfpage_core::{Color, Ctm, FillRule, PathSegment, Rect};

/// The type of paint operation applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    /// Path is stroked (outlined).
    Stroke,
    /// Path is filled.
    Fill,
    /// Path is filled, then stroked.
    FillAndStroke,
}

/// A shown glyph with its page-space box.
#[derive(Debug, Clone, PartialEq)]
pub struct CharEvent {
    /// The character code from the content stream.
    pub char_code: u32,
    /// Text the code maps to.
    pub text: String,
    /// Font resource name (e.g., "F1").
    pub font_name: String,
    /// Font size in text space units.
    pub font_size: f64,
    /// Glyph box in page-point space.
    pub rect: Rect,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvent {
    /// Segments in user space.
    pub segments: Vec<PathSegment>,
    pub paint_op: PaintOp,
    pub fill_rule: FillRule,
    /// Stroke width in user space.
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
    /// Maps user space to page-point space.
    pub ctm: Ctm,
}

/// Decoded image samples, straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A placed image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    /// XObject name (e.g., "Im0").
    pub name: String,
    /// CTM at the `Do` operator; maps the unit square onto the page.
    pub ctm: Ctm,
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// Color space name, when given by name.
    pub colorspace: Option<String>,
    /// Stream filter name (e.g., "DCTDecode").
    pub filter: Option<String>,
    /// Decoded samples, when the encoding is supported.
    pub data: Option<ImageData>,
}

/// Callback handler for content stream interpretation.
///
/// All methods have no-op defaults so handlers subscribe only to the
/// events they care about.
pub trait ContentHandler {
    /// Called for each shown glyph.
    fn on_char(&mut self, _event: CharEvent) {}

    /// Called when a path is stroked, filled, or both.
    fn on_path_painted(&mut self, _event: PathEvent) {}

    /// Called when an image XObject is placed.
    fn on_image(&mut self, _event: ImageEvent) {}

    /// Called for non-fatal problems; interpretation continues.
    fn on_warning(&mut self, _message: String) {}
}
