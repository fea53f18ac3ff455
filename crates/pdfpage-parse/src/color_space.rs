//! Colour space resolution for image XObjects and `cs`/`CS`.
//!
//! Device spaces, ICCBased (by component count), Cal* spaces, and Indexed
//! over one of those. Separation/DeviceN/Pattern are not resolved.

use crate::lopdf_backend::resolve_ref;

/// A colour space reduced to what sample conversion needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    /// Palette of `base` colours; `lookup` holds `(hival + 1) * n` bytes.
    Indexed {
        base: Box<ResolvedColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ResolvedColorSpace {
    /// Components per sample in this space.
    pub fn num_components(&self) -> usize {
        match self {
            ResolvedColorSpace::DeviceGray | ResolvedColorSpace::Indexed { .. } => 1,
            ResolvedColorSpace::DeviceRGB => 3,
            ResolvedColorSpace::DeviceCMYK => 4,
        }
    }

    /// Convert one 8-bit sample to opaque RGB.
    pub fn to_rgb(&self, sample: &[u8]) -> [u8; 3] {
        match self {
            ResolvedColorSpace::DeviceGray => {
                let g = sample.first().copied().unwrap_or(0);
                [g, g, g]
            }
            ResolvedColorSpace::DeviceRGB => match *sample {
                [r, g, b, ..] => [r, g, b],
                _ => [0, 0, 0],
            },
            ResolvedColorSpace::DeviceCMYK => match *sample {
                [c, m, y, k, ..] => {
                    let k = 255 - u16::from(k);
                    let ch = |v: u8| ((255 - u16::from(v)) * k / 255) as u8;
                    [ch(c), ch(m), ch(y)]
                }
                _ => [0, 0, 0],
            },
            ResolvedColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = usize::from(sample.first().copied().unwrap_or(0).min(*hival));
                let n = base.num_components();
                match lookup.get(index * n..(index + 1) * n) {
                    Some(entry) => base.to_rgb(entry),
                    None => [0, 0, 0],
                }
            }
        }
    }
}

/// Default space for a colour with `n` components.
pub fn from_component_count(n: usize) -> Option<ResolvedColorSpace> {
    match n {
        1 => Some(ResolvedColorSpace::DeviceGray),
        3 => Some(ResolvedColorSpace::DeviceRGB),
        4 => Some(ResolvedColorSpace::DeviceCMYK),
        _ => None,
    }
}

/// Resolve a colour space given by name (including abbreviations).
pub fn resolve_color_space_name(name: &[u8]) -> Option<ResolvedColorSpace> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(ResolvedColorSpace::DeviceGray),
        b"DeviceRGB" | b"RGB" | b"CalRGB" | b"Lab" => Some(ResolvedColorSpace::DeviceRGB),
        b"DeviceCMYK" | b"CMYK" => Some(ResolvedColorSpace::DeviceCMYK),
        _ => None,
    }
}

/// Resolve a colour space object: a name, or an array such as
/// `[/ICCBased 5 0 R]` or `[/Indexed /DeviceRGB 255 <...>]`.
pub fn resolve_color_space_object(
    doc: &lopdf::Document,
    obj: &lopdf::Object,
) -> Option<ResolvedColorSpace> {
    let obj = resolve_ref(doc, obj);
    if let Ok(name) = obj.as_name() {
        return resolve_color_space_name(name);
    }
    let arr = obj.as_array().ok()?;
    let family = arr.first()?.as_name().ok()?;
    match family {
        b"ICCBased" => {
            let stream = resolve_ref(doc, arr.get(1)?).as_stream().ok()?;
            let n = stream.dict.get(b"N").ok()?.as_i64().ok()?;
            from_component_count(usize::try_from(n).ok()?)
        }
        b"CalGray" | b"CalRGB" | b"Lab" => resolve_color_space_name(family),
        b"Indexed" | b"I" => {
            let base = resolve_color_space_object(doc, arr.get(1)?)?;
            if matches!(base, ResolvedColorSpace::Indexed { .. }) {
                return None;
            }
            let hival = u8::try_from(resolve_ref(doc, arr.get(2)?).as_i64().ok()?).ok()?;
            let lookup = match resolve_ref(doc, arr.get(3)?) {
                lopdf::Object::String(bytes, _) => bytes.clone(),
                lopdf::Object::Stream(s) => s.decompressed_content().ok()?,
                _ => return None,
            };
            Some(ResolvedColorSpace::Indexed {
                base: Box::new(base),
                hival,
                lookup,
            })
        }
        _ => None,
    }
}

/// Human-readable family name of a colour space object, for reporting.
pub fn color_space_label(doc: &lopdf::Document, obj: &lopdf::Object) -> Option<String> {
    let obj = resolve_ref(doc, obj);
    let name = match obj.as_name() {
        Ok(n) => n,
        Err(_) => obj.as_array().ok()?.first()?.as_name().ok()?,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}
