//! Render configuration.

/// How the renderer treats the alpha channel of the drawn surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlphaMode {
    /// Composite over opaque white and emit 3-channel RGB.
    #[default]
    Flatten,
    /// Skip the white composite and emit 4-channel RGBA.
    Preserve,
}

impl AlphaMode {
    /// Output channel count for this mode.
    pub fn channels(self) -> usize {
        match self {
            AlphaMode::Flatten => 3,
            AlphaMode::Preserve => 4,
        }
    }
}

/// Options controlling page rasterization and content interpretation.
///
/// The defaults reproduce a flattened, tightly packed RGB buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderOptions {
    /// Alpha handling (default: [`AlphaMode::Flatten`]).
    pub alpha: AlphaMode,
    /// Output row stride alignment in bytes (default: 1, i.e. no padding).
    /// Use 4 for GdkPixbuf-compatible rows.
    pub row_alignment: usize,
    /// Convert preserved alpha output from premultiplied to straight alpha
    /// (default: `false`, the literal premultiplied copy). Ignored when
    /// flattening.
    pub straight_alpha: bool,
    /// Largest surface, in pixels, the renderer will allocate
    /// (default: 16384 × 16384).
    pub max_pixels: u64,
    /// Maximum Form XObject nesting depth (default: 10).
    pub max_recursion_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            alpha: AlphaMode::Flatten,
            row_alignment: 1,
            straight_alpha: false,
            max_pixels: 16384 * 16384,
            max_recursion_depth: 10,
        }
    }
}
