//! Drawing surface handed to [`PageHandle::draw`](crate::PageHandle::draw).
//!
//! Wraps a tiny-skia pixmap whose base transform maps page-point space
//! (bottom-left origin, y up) onto the pixel grid (top-left origin, y down)
//! at the render scale. All drawing calls take page-space geometry.

use pdfpage_core::{Color, Ctm, FillRule, PageError, PathSegment, Rect};
use tiny_skia::{
    BlendMode, ColorU8, FilterQuality, Paint, PathBuilder, Pixmap, PixmapMut, PixmapPaint, Stroke,
    Transform,
};

/// A scaled, y-flipped drawing target backed by premultiplied RGBA pixels.
pub struct Canvas<'a> {
    pixmap: PixmapMut<'a>,
    base: Transform,
    scale: f64,
}

impl std::fmt::Debug for Canvas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("scale", &self.scale)
            .finish()
    }
}

impl<'a> Canvas<'a> {
    /// Canvas over `pixmap` for a page `page_height_pt` points tall,
    /// drawn at `scale` pixels per point.
    pub fn new(pixmap: PixmapMut<'a>, page_height_pt: f64, scale: f64) -> Self {
        let base = Transform::from_row(
            scale as f32,
            0.0,
            0.0,
            -scale as f32,
            0.0,
            (page_height_pt * scale) as f32,
        );
        Self {
            pixmap,
            base,
            scale,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Pixels per page point.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Fill a path given in user space; `ctm` maps it to page space.
    pub fn fill_path(
        &mut self,
        segments: &[PathSegment],
        ctm: &Ctm,
        color: Color,
        rule: FillRule,
    ) -> Result<(), PageError> {
        let Some(path) = build_path(segments) else {
            return Ok(());
        };
        let paint = solid_paint(color)?;
        let rule = match rule {
            FillRule::NonZero => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        };
        let ts = self.device_transform(ctm);
        self.pixmap.fill_path(&path, &paint, rule, ts, None);
        Ok(())
    }

    /// Stroke a path given in user space. A `line_width` of 0 draws the
    /// thinnest visible line.
    pub fn stroke_path(
        &mut self,
        segments: &[PathSegment],
        ctm: &Ctm,
        color: Color,
        line_width: f64,
    ) -> Result<(), PageError> {
        let Some(path) = build_path(segments) else {
            return Ok(());
        };
        let paint = solid_paint(color)?;
        let stroke = Stroke {
            width: line_width.max(0.0) as f32,
            ..Stroke::default()
        };
        let ts = self.device_transform(ctm);
        self.pixmap.stroke_path(&path, &paint, &stroke, ts, None);
        Ok(())
    }

    /// Fill a page-space rectangle. Empty rectangles draw nothing.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), PageError> {
        let Some(r) = tiny_skia::Rect::from_ltrb(
            rect.x1 as f32,
            rect.y1 as f32,
            rect.x2 as f32,
            rect.y2 as f32,
        ) else {
            return Ok(());
        };
        let paint = solid_paint(color)?;
        self.pixmap.fill_rect(r, &paint, self.base, None);
        Ok(())
    }

    /// Draw straight-alpha RGBA8 samples into the unit square mapped by
    /// `ctm`. Sample row 0 lands at the top of the placement.
    pub fn draw_image(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        ctm: &Ctm,
    ) -> Result<(), PageError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PageError::render(format!(
                "image data is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            )));
        }
        let mut image = Pixmap::new(width, height)
            .ok_or_else(|| PageError::render(format!("cannot allocate {width}x{height} image")))?;
        for (dst, src) in image.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }

        let unit = Transform::from_row(
            1.0 / width as f32,
            0.0,
            0.0,
            -1.0 / height as f32,
            0.0,
            1.0,
        );
        let ts = self.device_transform(ctm).pre_concat(unit);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, ts, None);
        Ok(())
    }

    /// Paint opaque white behind everything drawn so far.
    pub(crate) fn composite_onto_white(&mut self) {
        let Some(full) = tiny_skia::Rect::from_xywh(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        ) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(tiny_skia::Color::WHITE);
        paint.blend_mode = BlendMode::DestinationOver;
        self.pixmap.fill_rect(full, &paint, Transform::identity(), None);
    }

    fn device_transform(&self, ctm: &Ctm) -> Transform {
        let [a, b, c, d, e, f] = ctm.0;
        self.base.pre_concat(Transform::from_row(
            a as f32, b as f32, c as f32, d as f32, e as f32, f as f32,
        ))
    }
}

fn solid_paint(color: Color) -> Result<Paint<'static>, PageError> {
    let c = color.clamped();
    let color = tiny_skia::Color::from_rgba(c.r, c.g, c.b, c.a)
        .ok_or_else(|| PageError::render(format!("invalid colour {color:?}")))?;
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    Ok(paint)
}

fn build_path(segments: &[PathSegment]) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for seg in segments {
        match *seg {
            PathSegment::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathSegment::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathSegment::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathSegment::ClosePath => pb.close(),
        }
    }
    pb.finish()
}
