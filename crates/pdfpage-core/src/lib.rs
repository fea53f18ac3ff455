//! pdfpage-core: backend-independent types and algorithms.
//!
//! Geometry and DPI scaling, the ARGB32 → RGB/RGBA pixel packer, render
//! options, the error taxonomy, and text search over positioned chars.
//! Nothing here parses PDF syntax or draws anything.

pub mod compositor;
pub mod error;
pub mod geometry;
pub mod images;
pub mod options;
pub mod path;
pub mod search;
pub mod text;

pub use compositor::{PixelBuffer, PixelLayout, Surface, pack, unpremultiply};
pub use error::PageError;
pub use geometry::{Ctm, POINTS_PER_INCH, Point, Rect, scale_for_dpi, scaled_dimensions};
pub use images::{ImagePlacement, placement_from_ctm};
pub use options::{AlphaMode, RenderOptions};
pub use path::{Color, FillRule, PathSegment};
pub use search::{SearchMatch, SearchOptions, search_chars};
pub use text::Char;
