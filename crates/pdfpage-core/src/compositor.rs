//! Pixel packing from a premultiplied ARGB32 surface into an RGB/RGBA buffer.
//!
//! The surface format stores one native-endian 32-bit word per pixel:
//! alpha in bits 24–31, red in 16–23, green in 8–15, blue in 0–7, with
//! colour channels premultiplied by alpha. Rows are `stride` bytes apart and
//! the stride may exceed `width * 4`.
//!
//! [`pack`] copies the channels literally. It does not undo the
//! premultiplication; call [`unpremultiply`] on a 4-channel result when
//! straight alpha is needed.

use crate::error::PageError;

/// Bytes per surface pixel.
pub const SURFACE_BYTES_PER_PIXEL: usize = 4;

/// A premultiplied ARGB32 surface (native word order).
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Surface {
    /// Wrap raw ARGB32 bytes.
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidParameter`] if the dimensions are zero or `data`
    /// is too short for `height` rows of `stride` bytes.
    pub fn from_argb_bytes(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, PageError> {
        check_input(data.len(), width, height, stride)?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Convert premultiplied RGBA bytes (R, G, B, A in memory order, as
    /// produced by tiny-skia) into ARGB32 words with a packed stride.
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidParameter`] if `rgba` does not hold exactly
    /// `width * height` pixels.
    pub fn from_premultiplied_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, PageError> {
        let expected = width as usize * height as usize * SURFACE_BYTES_PER_PIXEL;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(PageError::invalid(format!(
                "expected {expected} RGBA bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        let mut data = Vec::with_capacity(expected);
        for px in rgba.chunks_exact(SURFACE_BYTES_PER_PIXEL) {
            let word = u32::from(px[3]) << 24
                | u32::from(px[0]) << 16
                | u32::from(px[1]) << 8
                | u32::from(px[2]);
            data.extend_from_slice(&word.to_ne_bytes());
        }
        Ok(Self {
            width,
            height,
            stride: width as usize * SURFACE_BYTES_PER_PIXEL,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The ARGB word at `(x, y)`, top-left origin.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = y as usize * self.stride + x as usize * SURFACE_BYTES_PER_PIXEL;
        read_word(&self.data[offset..offset + SURFACE_BYTES_PER_PIXEL])
    }

    /// Pack this surface with [`pack`].
    pub fn pack(&self, layout: PixelLayout) -> Result<PixelBuffer, PageError> {
        pack(&self.data, self.width, self.height, self.stride, layout)
    }
}

/// Output channel count and row alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// 3 for RGB, 4 for RGBA.
    pub channels: usize,
    /// Row stride is rounded up to a multiple of this many bytes.
    pub row_alignment: usize,
}

impl PixelLayout {
    /// Tightly packed RGB.
    pub const RGB: PixelLayout = PixelLayout {
        channels: 3,
        row_alignment: 1,
    };
    /// Tightly packed RGBA.
    pub const RGBA: PixelLayout = PixelLayout {
        channels: 4,
        row_alignment: 1,
    };

    pub fn new(channels: usize, row_alignment: usize) -> Self {
        Self {
            channels,
            row_alignment,
        }
    }

    /// Output stride for a row of `width` pixels, or `None` when the
    /// alignment is zero or the stride does not fit in `usize`.
    pub fn stride_for(&self, width: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(self.channels)?
            .checked_next_multiple_of(self.row_alignment)
    }
}

/// An owned, packed pixel buffer with a top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * channels`.
    pub stride: usize,
    /// 3 (RGB) or 4 (RGBA).
    pub channels: usize,
    /// `height * stride` bytes; row padding is zero.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// The channel bytes of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = y as usize * self.stride + x as usize * self.channels;
        &self.data[offset..offset + self.channels]
    }

    /// Logical pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.channels]
    }
}

/// Pack an ARGB32 surface into an RGB or RGBA buffer.
///
/// For each pixel emits red, green, blue and, with 4 channels, alpha, taken
/// from bits 16–23, 8–15, 0–7 and 24–31 of the native-endian source word.
///
/// # Errors
///
/// [`PageError::InvalidParameter`] if `width` or `height` is zero, the
/// channel count is not 3 or 4, the alignment is zero, `stride_in` is
/// smaller than a row, `surface_bytes` is too short for the stated
/// geometry, or the aligned output cannot be sized or allocated.
pub fn pack(
    surface_bytes: &[u8],
    width: u32,
    height: u32,
    stride_in: usize,
    layout: PixelLayout,
) -> Result<PixelBuffer, PageError> {
    if layout.channels != 3 && layout.channels != 4 {
        return Err(PageError::invalid(format!(
            "channel count must be 3 or 4, got {}",
            layout.channels
        )));
    }
    if layout.row_alignment == 0 {
        return Err(PageError::invalid("row alignment must be at least 1"));
    }
    check_input(surface_bytes.len(), width, height, stride_in)?;

    let channels = layout.channels;
    let too_large = || {
        PageError::invalid(format!(
            "{width}x{height} output with {}-byte row alignment is too large",
            layout.row_alignment
        ))
    };
    let stride_out = layout.stride_for(width).ok_or_else(too_large)?;
    let len = stride_out
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| too_large())?;
    data.resize(len, 0);

    for (y, dst_row) in data.chunks_exact_mut(stride_out).enumerate() {
        let src_start = y * stride_in;
        let src_row = &surface_bytes[src_start..src_start + width as usize * SURFACE_BYTES_PER_PIXEL];
        for (src, dst) in src_row
            .chunks_exact(SURFACE_BYTES_PER_PIXEL)
            .zip(dst_row.chunks_exact_mut(channels))
        {
            let word = read_word(src);
            dst[0] = (word >> 16) as u8;
            dst[1] = (word >> 8) as u8;
            dst[2] = word as u8;
            if channels == 4 {
                dst[3] = (word >> 24) as u8;
            }
        }
    }

    Ok(PixelBuffer {
        width,
        height,
        stride: stride_out,
        channels,
        data,
    })
}

/// Convert a premultiplied RGBA buffer to straight alpha in place.
///
/// Fully transparent pixels become all zero. RGB buffers are left untouched.
pub fn unpremultiply(buffer: &mut PixelBuffer) {
    if buffer.channels != 4 {
        return;
    }
    let row_len = buffer.width as usize * 4;
    for row in buffer.data.chunks_exact_mut(buffer.stride) {
        for px in row[..row_len].chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            match a {
                0 => px[..3].fill(0),
                255 => {}
                _ => {
                    for c in &mut px[..3] {
                        *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                    }
                }
            }
        }
    }
}

fn read_word(bytes: &[u8]) -> u32 {
    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn check_input(len: usize, width: u32, height: u32, stride: usize) -> Result<(), PageError> {
    if width == 0 || height == 0 {
        return Err(PageError::invalid(format!(
            "surface dimensions must be positive, got {width}x{height}"
        )));
    }
    let row = width as usize * SURFACE_BYTES_PER_PIXEL;
    if stride < row {
        return Err(PageError::invalid(format!(
            "stride {stride} is smaller than a {width}-pixel row ({row} bytes)"
        )));
    }
    let needed = (height as usize - 1) * stride + row;
    if len < needed {
        return Err(PageError::invalid(format!(
            "surface holds {len} bytes, {needed} required for {width}x{height} at stride {stride}"
        )));
    }
    Ok(())
}
