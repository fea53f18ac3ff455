//! Glyph advance widths for simple fonts.
//!
//! Widths come from the font dictionary's `/FirstChar` + `/Widths`, then
//! from the built-in tables for the standard 14 fonts, then from a flat
//! default. All widths are in 1/1000 em.

use crate::lopdf_backend::{object_to_f64, resolve_ref};

/// Advance used when no other width is known.
pub const DEFAULT_WIDTH: f64 = 500.0;

/// Glyph ascent in em, used for glyph boxes.
pub const ASCENT: f64 = 0.75;

/// Glyph descent in em (negative, below the baseline).
pub const DESCENT: f64 = -0.25;

/// Width source for one font resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    base_font: String,
    first_char: u32,
    widths: Vec<f64>,
    standard: Option<&'static [u16; 95]>,
    missing_width: f64,
}

impl FontMetrics {
    /// Metrics for a font known only by its base name.
    pub fn standard(base_font: &str) -> Self {
        let name = strip_subset_prefix(base_font);
        Self {
            base_font: name.to_string(),
            first_char: 0,
            widths: Vec::new(),
            standard: standard_widths(name),
            missing_width: if is_courier(name) { 600.0 } else { DEFAULT_WIDTH },
        }
    }

    /// Load metrics from a font dictionary.
    pub fn from_dict(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let mut metrics = Self::standard(&base_font);

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| object_to_f64(resolve_ref(doc, w)).unwrap_or(0.0))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if !widths.is_empty() {
            metrics.first_char = first_char.max(0) as u32;
            metrics.widths = widths;
        }
        if let Some(mw) = font_descriptor_missing_width(doc, dict) {
            metrics.missing_width = mw;
        }
        metrics
    }

    /// Base font name without a subset prefix.
    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Advance width of `code` in 1/1000 em.
    pub fn width(&self, code: u32) -> f64 {
        if let Some(idx) = code.checked_sub(self.first_char) {
            if let Some(&w) = self.widths.get(idx as usize) {
                return w;
            }
        }
        if let Some(table) = self.standard {
            if (32..127).contains(&code) {
                return f64::from(table[(code - 32) as usize]);
            }
        }
        self.missing_width
    }
}

fn font_descriptor_missing_width(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<f64> {
    let fd = resolve_ref(doc, dict.get(b"FontDescriptor").ok()?).as_dict().ok()?;
    let mw = object_to_f64(resolve_ref(doc, fd.get(b"MissingWidth").ok()?)).ok()?;
    (mw > 0.0).then_some(mw)
}

/// Strip a subset tag such as `ABCDEF+` from a font name.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

fn is_courier(name: &str) -> bool {
    name.starts_with("Courier")
}

fn standard_widths(name: &str) -> Option<&'static [u16; 95]> {
    match name {
        "Helvetica" | "Helvetica-Oblique" | "Arial" | "ArialMT" => Some(&HELVETICA),
        "Helvetica-Bold" | "Helvetica-BoldOblique" | "Arial-BoldMT" => Some(&HELVETICA_BOLD),
        "Times-Roman" | "TimesNewRomanPSMT" => Some(&TIMES_ROMAN),
        "Times-Bold" | "TimesNewRomanPS-BoldMT" => Some(&TIMES_BOLD),
        _ => None,
    }
}

// Printable ASCII (32..=126) advance widths from the Adobe AFM files.

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];
