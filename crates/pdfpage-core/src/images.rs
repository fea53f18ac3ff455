//! Placement of raster images on a page.
//!
//! Image XObjects are painted into the unit square, which the CTM active at
//! the `Do` operator maps onto the page. The placement rectangle is the
//! bounding box of the transformed unit square, in page-point space.

use crate::geometry::{Ctm, Rect};

/// A raster image placed on a page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagePlacement {
    /// XObject name (e.g., "Im0"); empty for inline images.
    pub name: String,
    /// Placement rectangle in page-point space (bottom-left origin).
    pub rect: Rect,
    /// Source pixel width.
    pub src_width: u32,
    /// Source pixel height.
    pub src_height: u32,
    /// Color space name, when declared by name.
    pub color_space: Option<String>,
}

/// Bounding box of the unit square under `ctm`.
pub fn placement_from_ctm(ctm: &Ctm) -> Rect {
    ctm.transform_rect(&Rect::from_size(1.0, 1.0))
}
