//! Decoding of image XObject samples into straight RGBA8.
//!
//! Only images with 8 bits per component are decoded, through any chain of
//! ASCIIHex, ASCII85, LZW, and Flate filters. `/SMask` supplies alpha when
//! it decodes the same way.

use crate::color_space::resolve_color_space_object;
use crate::handler::ImageData;
use crate::lopdf_backend::resolve_ref;

/// Why an image could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    Filter(String),
    BitsPerComponent(i64),
    ColorSpace,
    ImageMask,
    Truncated { expected: usize, actual: usize },
    Corrupt(String),
    Dimensions,
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsupported::Filter(name) => write!(f, "unsupported filter /{name}"),
            Unsupported::BitsPerComponent(bpc) => write!(f, "unsupported {bpc} bits per component"),
            Unsupported::ColorSpace => write!(f, "unsupported colour space"),
            Unsupported::ImageMask => write!(f, "stencil masks are not decoded"),
            Unsupported::Truncated { expected, actual } => {
                write!(f, "sample data truncated: {actual} of {expected} bytes")
            }
            Unsupported::Corrupt(msg) => write!(f, "corrupt sample data: {msg}"),
            Unsupported::Dimensions => write!(f, "missing or invalid /Width or /Height"),
        }
    }
}

/// Filter names applied to a stream, outermost first.
pub fn filter_names(stream: &lopdf::Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Ok(lopdf::Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Ok(lopdf::Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// `/Width` and `/Height` of an image stream, when both are positive.
pub fn image_size(stream: &lopdf::Stream) -> Option<(u32, u32)> {
    let dim = |key: &[u8]| {
        stream
            .dict
            .get(key)
            .ok()
            .and_then(|o| o.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
    };
    Some((dim(b"Width")?, dim(b"Height")?))
}

/// Decode an image XObject to straight RGBA8.
pub fn decode_image(doc: &lopdf::Document, stream: &lopdf::Stream) -> Result<ImageData, Unsupported> {
    let (width, height) = image_size(stream).ok_or(Unsupported::Dimensions)?;
    let is_mask = stream
        .dict
        .get(b"ImageMask")
        .ok()
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);
    if is_mask {
        return Err(Unsupported::ImageMask);
    }
    let cs = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| resolve_color_space_object(doc, o))
        .ok_or(Unsupported::ColorSpace)?;
    let samples = decoded_samples(stream, width, height, cs.num_components())?;

    let pixel_count = width as usize * height as usize;
    let alpha = soft_mask(doc, stream, width, height);
    let n = cs.num_components();
    let mut rgba = Vec::with_capacity(pixel_count * 4);
    for i in 0..pixel_count {
        let [r, g, b] = cs.to_rgb(&samples[i * n..(i + 1) * n]);
        let a = alpha.as_ref().map_or(255, |mask| mask[i]);
        rgba.extend_from_slice(&[r, g, b, a]);
    }
    Ok(ImageData {
        width,
        height,
        rgba,
    })
}

fn decoded_samples(
    stream: &lopdf::Stream,
    width: u32,
    height: u32,
    components: usize,
) -> Result<Vec<u8>, Unsupported> {
    let bpc = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bpc != 8 {
        return Err(Unsupported::BitsPerComponent(bpc));
    }
    let data = unfiltered(stream)?;
    let expected = width as usize * height as usize * components;
    if data.len() < expected {
        return Err(Unsupported::Truncated {
            expected,
            actual: data.len(),
        });
    }
    Ok(data)
}

/// Stream content with every filter removed, outermost first.
fn unfiltered(stream: &lopdf::Stream) -> Result<Vec<u8>, Unsupported> {
    let params = stream.dict.get(b"DecodeParms").ok().filter(|p| p.as_dict().is_ok());
    let mut data = stream.content.clone();
    for filter in filter_names(stream) {
        data = match filter.as_str() {
            "ASCIIHexDecode" => ascii_hex_decode(&data)?,
            "FlateDecode" | "LZWDecode" | "ASCII85Decode" => {
                let mut dict = lopdf::Dictionary::new();
                dict.set("Filter", lopdf::Object::Name(filter.clone().into_bytes()));
                if let Some(params) = params {
                    dict.set("DecodeParms", params.clone());
                }
                lopdf::Stream::new(dict, data)
                    .decompressed_content()
                    .map_err(|e| Unsupported::Corrupt(e.to_string()))?
            }
            _ => return Err(Unsupported::Filter(filter)),
        };
    }
    Ok(data)
}

/// ASCIIHexDecode: whitespace is skipped, `>` ends the data, and an odd
/// final digit is padded with zero.
fn ascii_hex_decode(input: &[u8]) -> Result<Vec<u8>, Unsupported> {
    let mut out = Vec::with_capacity(input.len() / 2);
    let mut high: Option<u8> = None;
    for &b in input {
        if b == b'>' {
            break;
        }
        if b.is_ascii_whitespace() || b == 0 {
            continue;
        }
        let digit = char::from(b)
            .to_digit(16)
            .ok_or_else(|| Unsupported::Corrupt(format!("invalid hex digit 0x{b:02X}")))?
            as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | digit),
            None => high = Some(digit),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

/// Alpha samples from `/SMask`, when it matches the image size and decodes.
fn soft_mask(doc: &lopdf::Document, stream: &lopdf::Stream, width: u32, height: u32) -> Option<Vec<u8>> {
    let mask = resolve_ref(doc, stream.dict.get(b"SMask").ok()?).as_stream().ok()?;
    if image_size(mask)? != (width, height) {
        return None;
    }
    decoded_samples(mask, width, height, 1).ok()
}
