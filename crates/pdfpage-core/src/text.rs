//! Positioned characters.

use crate::geometry::Rect;

/// A single glyph with its text and page-point box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Char {
    /// Text this glyph maps to (usually one character).
    pub text: String,
    /// Glyph box in page-point space (bottom-left origin).
    pub rect: Rect,
    /// Font size in text space units.
    pub size: f64,
}

impl Char {
    pub fn new(text: impl Into<String>, rect: Rect, size: f64) -> Self {
        Self {
            text: text.into(),
            rect,
            size,
        }
    }
}
