//! Page rasterization at an arbitrary DPI.
//!
//! The renderer draws a [`PageHandle`] into a zeroed premultiplied surface,
//! composites it onto white (unless alpha is preserved), and packs the
//! result with the pixel compositor.

use pdfpage_core::{
    AlphaMode, PageError, PixelBuffer, PixelLayout, RenderOptions, Surface, scale_for_dpi,
    scaled_dimensions, unpremultiply,
};
use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::page::PageHandle;

/// A rendered page, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub width: u32,
    pub height: u32,
    /// `true` when `pixels` carries an alpha channel (4 bytes per pixel).
    pub has_alpha: bool,
    /// Bytes per row, including padding.
    pub stride: usize,
    /// `height * stride` bytes, rows top to bottom, RGB or RGBA order.
    pub pixels: Vec<u8>,
}

impl RenderResult {
    /// Bytes per pixel: 3 or 4.
    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }

    /// Channel bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = y as usize * self.stride + x as usize * self.channels();
        &self.pixels[offset..offset + self.channels()]
    }
}

impl From<PixelBuffer> for RenderResult {
    fn from(buf: PixelBuffer) -> Self {
        Self {
            width: buf.width,
            height: buf.height,
            has_alpha: buf.has_alpha(),
            stride: buf.stride,
            pixels: buf.data,
        }
    }
}

/// Renders pages with a fixed set of [`RenderOptions`].
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    options: RenderOptions,
}

impl PageRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `page` at `dpi`.
    ///
    /// Output size is `round(dimension / 72 * dpi)` per side, at least 1.
    ///
    /// # Errors
    ///
    /// - [`PageError::InvalidParameter`] for a non-positive or non-finite
    ///   DPI, invalid page dimensions, or invalid options.
    /// - [`PageError::RenderFailure`] if the surface is too large or cannot
    ///   be allocated, or the page fails to draw.
    pub fn render<P: PageHandle + ?Sized>(&self, page: &P, dpi: f64) -> Result<RenderResult, PageError> {
        let (page_w, page_h) = page.dimensions();
        let (width, height) = scaled_dimensions(page_w, page_h, dpi)?;
        let scale = scale_for_dpi(dpi)?;
        let layout = PixelLayout::new(self.options.alpha.channels(), self.options.row_alignment);
        if layout.row_alignment == 0 {
            return Err(PageError::invalid("row_alignment must be at least 1"));
        }
        let output_len = layout
            .stride_for(width)
            .and_then(|stride| stride.checked_mul(height as usize));
        if output_len.is_none() {
            return Err(PageError::invalid(format!(
                "row_alignment {} overflows a {width}x{height} buffer",
                layout.row_alignment
            )));
        }

        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.options.max_pixels {
            return Err(PageError::render(format!(
                "{width}x{height} surface exceeds the limit of {} pixels",
                self.options.max_pixels
            )));
        }
        debug!(page = page.index(), dpi, width, height, "rendering page");

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| PageError::render(format!("cannot allocate {width}x{height} surface")))?;
        {
            let mut canvas = Canvas::new(pixmap.as_mut(), page_h, scale);
            if let Err(e) = page.draw(&mut canvas) {
                warn!(page = page.index(), error = %e, "page draw failed");
                return Err(match e {
                    PageError::RenderFailure(_) => e,
                    other => PageError::render(format!("page draw failed: {other}")),
                });
            }
            if self.options.alpha == AlphaMode::Flatten {
                canvas.composite_onto_white();
            }
        }

        let surface = Surface::from_premultiplied_rgba(width, height, pixmap.data())?;
        drop(pixmap);
        let mut buffer = surface.pack(layout)?;
        if self.options.straight_alpha && buffer.has_alpha() {
            unpremultiply(&mut buffer);
        }
        Ok(buffer.into())
    }
}

/// Render `page` at `dpi` with default options (opaque RGB on white).
///
/// # Errors
///
/// See [`PageRenderer::render`].
pub fn render<P: PageHandle + ?Sized>(page: &P, dpi: f64) -> Result<RenderResult, PageError> {
    PageRenderer::default().render(page, dpi)
}
