//! Page geometry: rectangles, affine matrices, and DPI scaling.
//!
//! Page-point space is PDF's native coordinate system: origin at the
//! bottom-left corner, y increasing upward, 72 units per inch. Output
//! pixel buffers use a top-left origin; the flip happens in the renderer.

use crate::error::PageError;

/// Page-point units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle `{x1, y1, x2, y2}`.
///
/// Either in page-point space or in the normalized unit square, depending
/// on where it came from; the two are never mixed in one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Build a rectangle from two corners, ordering them so that
    /// `x1 <= x2` and `y1 <= y2`.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Rectangle spanning `(0, 0)` to `(width, height)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Smallest rectangle containing all the given points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect {
            x1: first.x,
            y1: first.y,
            x2: first.x,
            y2: first.y,
        };
        for p in iter {
            rect.x1 = rect.x1.min(p.x);
            rect.y1 = rect.y1.min(p.y);
            rect.x2 = rect.x2.max(p.x);
            rect.y2 = rect.y2.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Map a page-point rectangle into the unit square of a
    /// `page_width` × `page_height` page.
    ///
    /// Coordinates are divided, not clamped: a rectangle that lies outside
    /// the page yields values outside `[0, 1]`.
    pub fn normalized(&self, page_width: f64, page_height: f64) -> Rect {
        Rect {
            x1: self.x1 / page_width,
            y1: self.y1 / page_height,
            x2: self.x2 / page_width,
            y2: self.y2 / page_height,
        }
    }
}

/// Affine transformation matrix `[a, b, c, d, e, f]` in PDF convention.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ctm(pub [f64; 6]);

impl Default for Ctm {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Ctm {
    pub const IDENTITY: Ctm = Ctm([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Ctm([a, b, c, d, e, f])
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Ctm([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` followed by `other`.
    ///
    /// The `cm` operator computes `m.concat(&ctm)`.
    pub fn concat(&self, other: &Ctm) -> Ctm {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Ctm([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    pub fn transform_point(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Bounding box of `rect` after transformation.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x2, rect.y1),
            Point::new(rect.x1, rect.y2),
            Point::new(rect.x2, rect.y2),
        ];
        // Four corners, never empty.
        Rect::bounding(corners.map(|p| self.transform_point(p))).unwrap_or_default()
    }

    /// Geometric mean of the axis scale factors, used to scale line widths.
    pub fn scale_factor(&self) -> f64 {
        let [a, b, c, d, _, _] = self.0;
        (a * d - b * c).abs().sqrt()
    }
}

/// Scale factor from page points to pixels at `dpi`.
///
/// # Errors
///
/// [`PageError::InvalidParameter`] if `dpi` is not a finite positive number.
pub fn scale_for_dpi(dpi: f64) -> Result<f64, PageError> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(PageError::invalid(format!(
            "dpi must be a finite positive number, got {dpi}"
        )));
    }
    Ok(dpi / POINTS_PER_INCH)
}

/// Pixel dimensions of a `width_pt` × `height_pt` page rendered at `dpi`.
///
/// Each side is `round(dimension / 72 * dpi)`, clamped to at least 1.
///
/// # Errors
///
/// - [`PageError::InvalidParameter`] if either dimension is not a finite
///   positive number or `dpi` is invalid.
/// - [`PageError::RenderFailure`] if a side overflows `u32`; the surface is
///   too large to allocate at this resolution.
pub fn scaled_dimensions(width_pt: f64, height_pt: f64, dpi: f64) -> Result<(u32, u32), PageError> {
    scale_for_dpi(dpi)?;
    for (name, value) in [("width", width_pt), ("height", height_pt)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(PageError::invalid(format!(
                "page {name} must be a finite positive number, got {value}"
            )));
        }
    }
    Ok((scale_side(width_pt, dpi)?, scale_side(height_pt, dpi)?))
}

fn scale_side(dimension_pt: f64, dpi: f64) -> Result<u32, PageError> {
    let px = (dimension_pt / POINTS_PER_INCH * dpi).round();
    if !px.is_finite() || px > u32::MAX as f64 {
        return Err(PageError::render(format!(
            "{dimension_pt}pt at {dpi} dpi exceeds the maximum surface size"
        )));
    }
    Ok((px as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_new_orders_corners() {
        let r = Rect::new(30.0, 40.0, 10.0, 20.0);
        assert_eq!(r, Rect { x1: 10.0, y1: 20.0, x2: 30.0, y2: 40.0 });
        assert_eq!(r.width(), 20.0);
        assert_eq!(r.height(), 20.0);
    }

    #[test]
    fn rect_union() {
        let a = Rect::new(10.0, 20.0, 30.0, 40.0);
        let b = Rect::new(5.0, 25.0, 35.0, 45.0);
        assert_eq!(a.union(&b), Rect::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn rect_bounding_empty_is_none() {
        assert!(Rect::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn normalize_letter_page() {
        let hit = Rect::new(36.0, 36.0, 72.0, 72.0);
        let n = hit.normalized(612.0, 792.0);
        assert!((n.x1 - 36.0 / 612.0).abs() < 1e-6);
        assert!((n.x2 - 72.0 / 612.0).abs() < 1e-6);
        assert!((n.y1 - 36.0 / 792.0).abs() < 1e-6);
        assert!((n.y2 - 72.0 / 792.0).abs() < 1e-6);
        assert!((n.x1 - 0.0588).abs() < 1e-4);
        assert!((n.y2 - 0.0909).abs() < 1e-4);
    }

    #[test]
    fn normalize_does_not_clamp() {
        let n = Rect::new(-61.2, 0.0, 1224.0, 792.0).normalized(612.0, 792.0);
        assert!((n.x1 + 0.1).abs() < 1e-9);
        assert!((n.x2 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ctm_concat_translate_then_scale() {
        let translate = Ctm::translate(10.0, 20.0);
        let scale = Ctm::new(2.0, 0.0, 0.0, 3.0, 0.0, 0.0);
        let p = translate.concat(&scale).transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(22.0, 63.0));
    }

    #[test]
    fn ctm_transform_rect_rotated() {
        // 90° rotation: (x, y) -> (-y, x)
        let rot = Ctm::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let r = rot.transform_rect(&Rect::new(0.0, 0.0, 10.0, 5.0));
        assert_eq!(r, Rect::new(-5.0, 0.0, 0.0, 10.0));
    }

    #[test]
    fn ctm_scale_factor() {
        assert_eq!(Ctm::new(2.0, 0.0, 0.0, 2.0, 5.0, 5.0).scale_factor(), 2.0);
        assert_eq!(Ctm::IDENTITY.scale_factor(), 1.0);
    }

    #[test]
    fn scale_for_dpi_values() {
        assert_eq!(scale_for_dpi(72.0).unwrap(), 1.0);
        assert_eq!(scale_for_dpi(144.0).unwrap(), 2.0);
        assert!((scale_for_dpi(96.0).unwrap() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn scale_for_dpi_rejects_bad_values() {
        for dpi in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(scale_for_dpi(dpi), Err(PageError::InvalidParameter(_))),
                "dpi {dpi} should be rejected"
            );
        }
    }

    #[test]
    fn scaled_dimensions_at_72_dpi_is_identity() {
        assert_eq!(scaled_dimensions(612.0, 792.0, 72.0).unwrap(), (612, 792));
        assert_eq!(scaled_dimensions(595.3, 841.9, 72.0).unwrap(), (595, 842));
    }

    #[test]
    fn scaled_dimensions_rounds() {
        // 612 / 72 * 100 = 850; 792 / 72 * 100 = 1100
        assert_eq!(scaled_dimensions(612.0, 792.0, 100.0).unwrap(), (850, 1100));
        // 10 / 72 * 150 = 20.83 -> 21
        assert_eq!(scaled_dimensions(10.0, 10.0, 150.0).unwrap(), (21, 21));
    }

    #[test]
    fn scaled_dimensions_clamps_to_one() {
        assert_eq!(scaled_dimensions(0.1, 0.1, 1.0).unwrap(), (1, 1));
    }

    #[test]
    fn scaled_dimensions_monotonic_in_dpi() {
        let mut prev = (0, 0);
        let mut dpi = 0.5;
        while dpi < 1200.0 {
            let dims = scaled_dimensions(612.0, 792.0, dpi).unwrap();
            assert!(dims.0 >= prev.0 && dims.1 >= prev.1, "not monotonic at {dpi}");
            prev = dims;
            dpi += 7.25;
        }
    }

    #[test]
    fn scaled_dimensions_rejects_bad_inputs() {
        assert!(matches!(
            scaled_dimensions(0.0, 792.0, 72.0),
            Err(PageError::InvalidParameter(_))
        ));
        assert!(matches!(
            scaled_dimensions(612.0, -1.0, 72.0),
            Err(PageError::InvalidParameter(_))
        ));
        assert!(matches!(
            scaled_dimensions(612.0, 792.0, 0.0),
            Err(PageError::InvalidParameter(_))
        ));
        assert!(matches!(
            scaled_dimensions(612.0, 792.0, -5.0),
            Err(PageError::InvalidParameter(_))
        ));
        assert!(matches!(
            scaled_dimensions(1.0e300, 792.0, 1.0e10),
            Err(PageError::RenderFailure(_))
        ));
        assert!(matches!(
            scaled_dimensions(612.0, 792.0, 1.0e12),
            Err(PageError::RenderFailure(_))
        ));
    }
}
