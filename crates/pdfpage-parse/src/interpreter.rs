//! Content stream interpreter.
//!
//! Tokenizes a content stream, maintains the graphics and text state, and
//! emits events to a [`ContentHandler`]. Form XObjects are interpreted
//! recursively through `Do`; inline images are reported like image XObjects.

use std::collections::HashMap;

use lopdf::Object;
use pdfpage_core::{Color, Ctm, FillRule, PathSegment, Point, Rect, RenderOptions};
use tracing::{debug, trace};

use crate::color_space::{color_space_label, resolve_color_space_name, resolve_color_space_object};
use crate::error::BackendError;
use crate::font_metrics::{ASCENT, DESCENT, FontMetrics};
use crate::handler::{CharEvent, ContentHandler, ImageEvent, PaintOp, PathEvent};
use crate::image_decode::{decode_image, filter_names, image_size};
use crate::interpreter_state::InterpreterState;
use crate::lopdf_backend::{object_to_f64, resolve_ref};
use crate::tokenizer::tokenize;

/// Path under construction between the first construction operator and
/// the painting operator.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self.start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
            return;
        }
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        if self.current.is_none() {
            self.move_to(c1);
        }
        self.segments.push(PathSegment::CurveTo(c1, c2, end));
        self.current = Some(end);
    }

    fn close(&mut self) {
        if self.current.is_some() {
            self.segments.push(PathSegment::ClosePath);
            self.current = self.start;
        }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(Point::new(x, y));
        self.line_to(Point::new(x + w, y));
        self.line_to(Point::new(x + w, y + h));
        self.line_to(Point::new(x, y + h));
        self.close();
    }

    fn take(&mut self) -> Vec<PathSegment> {
        self.current = None;
        self.start = None;
        std::mem::take(&mut self.segments)
    }
}

/// Per-stream interpretation context.
struct Frame<'a> {
    doc: &'a lopdf::Document,
    resources: &'a lopdf::Dictionary,
    options: &'a RenderOptions,
    depth: usize,
    fonts: HashMap<String, FontMetrics>,
}

/// Interpret a decoded content stream and emit events to `handler`.
///
/// `depth` is 0 for a page and increases by one for each nested form
/// XObject.
///
/// # Errors
///
/// [`BackendError::Parse`] if the stream cannot be tokenized;
/// [`BackendError::Interpreter`] if `depth` exceeds the configured limit.
pub(crate) fn interpret_content_stream(
    doc: &lopdf::Document,
    stream_bytes: &[u8],
    resources: &lopdf::Dictionary,
    handler: &mut dyn ContentHandler,
    options: &RenderOptions,
    depth: usize,
    state: &mut InterpreterState,
) -> Result<(), BackendError> {
    if depth > options.max_recursion_depth {
        return Err(BackendError::Interpreter(format!(
            "form XObject recursion depth {depth} exceeds limit {}",
            options.max_recursion_depth
        )));
    }

    let operations = tokenize(stream_bytes)?;
    trace!(depth, operations = operations.len(), "interpreting content stream");

    let mut frame = Frame {
        doc,
        resources,
        options,
        depth,
        fonts: HashMap::new(),
    };
    let mut path = PathBuilder::default();
    let base_depth = state.depth();

    for op in &operations {
        let ops = &op.operands;
        match op.operator.as_str() {
            // --- Graphics state ---
            "q" => state.save(),
            "Q" => {
                if state.depth() > base_depth {
                    state.restore();
                } else {
                    handler.on_warning("unbalanced Q operator ignored".to_string());
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(ops) {
                    state.concat_matrix(&m);
                }
            }
            "w" => {
                if let Some(w) = f64_at(ops, 0) {
                    state.gs_mut().line_width = w;
                }
            }
            "gs" => {
                if let Some(name) = name_at(ops, 0) {
                    apply_ext_gstate(&frame, &name, state, handler);
                }
            }

            // --- Colour ---
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(c) = color_operands(ops) {
                    state.gs_mut().fill_color = c;
                } else if !ops.is_empty() {
                    debug!(operator = %op.operator, "non-numeric fill colour ignored");
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(c) = color_operands(ops) {
                    state.gs_mut().stroke_color = c;
                } else if !ops.is_empty() {
                    debug!(operator = %op.operator, "non-numeric stroke colour ignored");
                }
            }
            "cs" => state.gs_mut().fill_color = initial_color(&frame, ops),
            "CS" => state.gs_mut().stroke_color = initial_color(&frame, ops),

            // --- Path construction ---
            "m" => {
                if let Some(p) = point_at(ops, 0) {
                    path.move_to(p);
                }
            }
            "l" => {
                if let Some(p) = point_at(ops, 0) {
                    path.line_to(p);
                }
            }
            "c" => {
                if let (Some(c1), Some(c2), Some(end)) =
                    (point_at(ops, 0), point_at(ops, 2), point_at(ops, 4))
                {
                    path.curve_to(c1, c2, end);
                }
            }
            "v" => {
                if let (Some(c2), Some(end)) = (point_at(ops, 0), point_at(ops, 2)) {
                    let c1 = path.current.unwrap_or(c2);
                    path.curve_to(c1, c2, end);
                }
            }
            "y" => {
                if let (Some(c1), Some(end)) = (point_at(ops, 0), point_at(ops, 2)) {
                    path.curve_to(c1, end, end);
                }
            }
            "h" => path.close(),
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) =
                    (f64_at(ops, 0), f64_at(ops, 1), f64_at(ops, 2), f64_at(ops, 3))
                {
                    path.rect(x, y, w, h);
                }
            }

            // --- Path painting ---
            "S" => paint(&mut path, state, handler, PaintOp::Stroke, FillRule::NonZero),
            "s" => {
                path.close();
                paint(&mut path, state, handler, PaintOp::Stroke, FillRule::NonZero);
            }
            "f" | "F" => paint(&mut path, state, handler, PaintOp::Fill, FillRule::NonZero),
            "f*" => paint(&mut path, state, handler, PaintOp::Fill, FillRule::EvenOdd),
            "B" => paint(&mut path, state, handler, PaintOp::FillAndStroke, FillRule::NonZero),
            "B*" => paint(&mut path, state, handler, PaintOp::FillAndStroke, FillRule::EvenOdd),
            "b" => {
                path.close();
                paint(&mut path, state, handler, PaintOp::FillAndStroke, FillRule::NonZero);
            }
            "b*" => {
                path.close();
                paint(&mut path, state, handler, PaintOp::FillAndStroke, FillRule::EvenOdd);
            }
            "n" => {
                path.take();
            }
            // Clipping paths are not tracked.
            "W" | "W*" => {}

            // --- Text object and state ---
            "BT" => state.begin_text(),
            "ET" => {}
            "Tf" => {
                if let (Some(name), Some(size)) = (name_at(ops, 0), f64_at(ops, 1)) {
                    let text = &mut state.gs_mut().text;
                    text.font_name = name;
                    text.font_size = size;
                }
            }
            "Tc" => {
                if let Some(v) = f64_at(ops, 0) {
                    state.gs_mut().text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = f64_at(ops, 0) {
                    state.gs_mut().text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = f64_at(ops, 0) {
                    state.gs_mut().text.horizontal_scaling = v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = f64_at(ops, 0) {
                    state.gs_mut().text.leading = v;
                }
            }
            "Ts" => {
                if let Some(v) = f64_at(ops, 0) {
                    state.gs_mut().text.rise = v;
                }
            }

            // --- Text positioning ---
            "Td" => {
                if let (Some(tx), Some(ty)) = (f64_at(ops, 0), f64_at(ops, 1)) {
                    state.move_text_position(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (f64_at(ops, 0), f64_at(ops, 1)) {
                    state.gs_mut().text.leading = -ty;
                    state.move_text_position(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(ops) {
                    state.set_text_matrix(m);
                }
            }
            "T*" => state.next_line(),

            // --- Text showing ---
            "Tj" => {
                if let Some(bytes) = string_at(ops, 0) {
                    show_string(&mut frame, state, handler, bytes);
                }
            }
            "'" => {
                state.next_line();
                if let Some(bytes) = string_at(ops, 0) {
                    show_string(&mut frame, state, handler, bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (f64_at(ops, 0), f64_at(ops, 1)) {
                    let text = &mut state.gs_mut().text;
                    text.word_spacing = aw;
                    text.char_spacing = ac;
                }
                state.next_line();
                if let Some(bytes) = string_at(ops, 2) {
                    show_string(&mut frame, state, handler, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = ops.first() {
                    show_positioned(&mut frame, state, handler, items);
                }
            }

            // --- XObjects ---
            "Do" => {
                if let Some(name) = name_at(ops, 0) {
                    handle_do(&mut frame, state, handler, &name)?;
                }
            }
            "BI" => handle_inline_image(&frame, state, handler, ops),
            "sh" => handler.on_warning("shading fills are not supported".to_string()),

            other => {
                trace!(operator = other, "operator ignored");
            }
        }
    }

    while state.depth() > base_depth {
        state.restore();
    }
    Ok(())
}

fn paint(
    path: &mut PathBuilder,
    state: &InterpreterState,
    handler: &mut dyn ContentHandler,
    paint_op: PaintOp,
    fill_rule: FillRule,
) {
    let segments = path.take();
    if segments.is_empty() {
        return;
    }
    let gs = state.gs();
    handler.on_path_painted(PathEvent {
        segments,
        paint_op,
        fill_rule,
        line_width: gs.line_width,
        stroke_color: gs.effective_stroke(),
        fill_color: gs.effective_fill(),
        ctm: gs.ctm,
    });
}

fn font_metrics<'f>(
    frame: &'f mut Frame<'_>,
    handler: &mut dyn ContentHandler,
    name: &str,
) -> &'f FontMetrics {
    let doc = frame.doc;
    let resources = frame.resources;
    frame.fonts.entry(name.to_string()).or_insert_with(|| {
        let dict = resources
            .get(b"Font")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| fonts.get(name.as_bytes()).ok())
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_dict().ok());
        match dict {
            Some(d) => {
                if d.get(b"Subtype").ok().and_then(|o| o.as_name().ok()) == Some(b"Type0") {
                    handler.on_warning(format!(
                        "font /{name} is a composite font; codes are read as single bytes"
                    ));
                }
                FontMetrics::from_dict(doc, d)
            }
            None => {
                handler.on_warning(format!("font /{name} not found in resources"));
                FontMetrics::standard(name)
            }
        }
    })
}

/// Show one string (`Tj`, `'`, `"`), advancing the text matrix per glyph.
fn show_string(
    frame: &mut Frame<'_>,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
    bytes: &[u8],
) {
    let font_name = state.gs().text.font_name.clone();
    let metrics = font_metrics(frame, handler, &font_name).clone();

    for &byte in bytes {
        let code = u32::from(byte);
        let w0 = metrics.width(code) / 1000.0;
        let trm = state.text_rendering_matrix();
        let glyph_box = Rect::new(0.0, DESCENT, w0, ASCENT);

        handler.on_char(CharEvent {
            char_code: code,
            text: char::from(byte).to_string(),
            font_name: font_name.clone(),
            font_size: state.gs().text.font_size,
            rect: trm.transform_rect(&glyph_box),
        });

        let text = &state.gs().text;
        let word_spacing = if byte == b' ' { text.word_spacing } else { 0.0 };
        let tx = (w0 * text.font_size + text.char_spacing + word_spacing) * text.horizontal_scaling;
        state.advance(tx);
    }
}

/// `TJ`: strings interleaved with adjustments in thousandths of an em.
fn show_positioned(
    frame: &mut Frame<'_>,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
    items: &[Object],
) {
    for item in items {
        match item {
            Object::String(bytes, _) => show_string(frame, state, handler, bytes),
            other => {
                if let Ok(adjust) = object_to_f64(other) {
                    let text = &state.gs().text;
                    let tx = -adjust / 1000.0 * text.font_size * text.horizontal_scaling;
                    state.advance(tx);
                }
            }
        }
    }
}

fn apply_ext_gstate(
    frame: &Frame<'_>,
    name: &str,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
) {
    let doc = frame.doc;
    let dict = frame
        .resources
        .get(b"ExtGState")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .and_then(|d| d.get(name.as_bytes()).ok())
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok());
    let Some(dict) = dict else {
        handler.on_warning(format!("ExtGState /{name} not found in resources"));
        return;
    };
    let number = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|o| object_to_f64(resolve_ref(doc, o)).ok())
    };
    let gs = state.gs_mut();
    if let Some(lw) = number(b"LW") {
        gs.line_width = lw;
    }
    if let Some(ca) = number(b"ca") {
        gs.fill_alpha = ca.clamp(0.0, 1.0) as f32;
    }
    if let Some(ca) = number(b"CA") {
        gs.stroke_alpha = ca.clamp(0.0, 1.0) as f32;
    }
}

/// Colour after `cs`/`CS`: black in the new space.
fn initial_color(frame: &Frame<'_>, ops: &[Object]) -> Color {
    let Some(first) = ops.first() else {
        return Color::BLACK;
    };
    // Named spaces may live in /Resources/ColorSpace.
    let named = first.as_name().ok().and_then(|n| {
        frame
            .resources
            .get(b"ColorSpace")
            .ok()
            .map(|o| resolve_ref(frame.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(n).ok())
    });
    let resolved = resolve_color_space_object(frame.doc, named.unwrap_or(first));
    match resolved {
        Some(cs) => {
            let [r, g, b] = cs.to_rgb(&[0, 0, 0, 255]);
            Color::rgb(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0)
        }
        None => Color::BLACK,
    }
}

fn handle_do(
    frame: &mut Frame<'_>,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
    name: &str,
) -> Result<(), BackendError> {
    let doc = frame.doc;
    let stream = frame
        .resources
        .get(b"XObject")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .and_then(|d| d.get(name.as_bytes()).ok())
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_stream().ok());
    let Some(stream) = stream else {
        handler.on_warning(format!("XObject /{name} not found in resources"));
        return Ok(());
    };

    let subtype = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .unwrap_or(b"");

    match subtype {
        b"Form" => handle_form_xobject(frame, state, handler, stream, name),
        b"Image" => {
            handle_image_xobject(doc, stream, name, state, handler);
            Ok(())
        }
        other => {
            handler.on_warning(format!(
                "XObject /{name} has unknown subtype /{}",
                String::from_utf8_lossy(other)
            ));
            Ok(())
        }
    }
}

fn handle_form_xobject(
    frame: &mut Frame<'_>,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
    stream: &lopdf::Stream,
    name: &str,
) -> Result<(), BackendError> {
    if frame.depth + 1 > frame.options.max_recursion_depth {
        handler.on_warning(format!(
            "form XObject /{name} skipped: nesting deeper than {}",
            frame.options.max_recursion_depth
        ));
        return Ok(());
    }

    let doc = frame.doc;
    let content = match stream.decompressed_content() {
        Ok(bytes) => bytes,
        Err(_) if stream.dict.get(b"Filter").is_err() => stream.content.clone(),
        Err(e) => {
            handler.on_warning(format!("form XObject /{name} could not be decoded: {e}"));
            return Ok(());
        }
    };
    let resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .unwrap_or(frame.resources);

    state.save();
    let matrix = stream
        .dict
        .get(b"Matrix")
        .ok()
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| matrix_operands(arr));
    if let Some(m) = matrix {
        state.concat_matrix(&m);
    }
    let result = interpret_content_stream(
        doc,
        &content,
        resources,
        handler,
        frame.options,
        frame.depth + 1,
        state,
    );
    state.restore();
    result
}

fn handle_image_xobject(
    doc: &lopdf::Document,
    stream: &lopdf::Stream,
    name: &str,
    state: &InterpreterState,
    handler: &mut dyn ContentHandler,
) {
    let (width, height) = image_size(stream).unwrap_or((0, 0));
    let colorspace = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| color_space_label(doc, o));
    let filter = filter_names(stream).pop();

    let data = match decode_image(doc, stream) {
        Ok(data) => Some(data),
        Err(reason) => {
            debug!(image = name, %reason, "image placed without pixels");
            let label = if name.is_empty() {
                "inline image".to_string()
            } else {
                format!("image /{name}")
            };
            handler.on_warning(format!("{label} not decoded: {reason}"));
            None
        }
    };

    handler.on_image(ImageEvent {
        name: name.to_string(),
        ctm: state.ctm(),
        width,
        height,
        colorspace,
        filter,
        data,
    });
}

/// `BI`: the tokenizer hands over the expanded dictionary and the raw
/// samples. The image occupies the unit square under the CTM, like an
/// image XObject, and is reported with an empty name.
fn handle_inline_image(
    frame: &Frame<'_>,
    state: &InterpreterState,
    handler: &mut dyn ContentHandler,
    operands: &[Object],
) {
    let (Some(Object::Dictionary(dict)), Some(Object::String(data, _))) =
        (operands.first(), operands.get(1))
    else {
        return;
    };
    let mut dict = dict.clone();
    // A colour space name other than a device space refers to the
    // /ColorSpace resources.
    let named = dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .ok()
        .filter(|n| resolve_color_space_name(n).is_none())
        .map(<[u8]>::to_vec);
    if let Some(name) = named {
        let resource = frame
            .resources
            .get(b"ColorSpace")
            .ok()
            .map(|o| resolve_ref(frame.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|spaces| spaces.get(&name).ok())
            .cloned();
        if let Some(cs) = resource {
            dict.set("ColorSpace", cs);
        }
    }
    let mut stream = lopdf::Stream::new(dict, data.clone());
    stream.allows_compression = false;
    handle_image_xobject(frame.doc, &stream, "", state, handler);
}

fn f64_at(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| object_to_f64(o).ok())
}

fn point_at(operands: &[Object], index: usize) -> Option<Point> {
    Some(Point::new(
        f64_at(operands, index)?,
        f64_at(operands, index + 1)?,
    ))
}

fn name_at(operands: &[Object], index: usize) -> Option<String> {
    operands
        .get(index)
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

fn string_at(operands: &[Object], index: usize) -> Option<&[u8]> {
    match operands.get(index) {
        Some(Object::String(bytes, _)) => Some(bytes),
        _ => None,
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Ctm> {
    if operands.len() < 6 {
        return None;
    }
    Some(Ctm::new(
        f64_at(operands, 0)?,
        f64_at(operands, 1)?,
        f64_at(operands, 2)?,
        f64_at(operands, 3)?,
        f64_at(operands, 4)?,
        f64_at(operands, 5)?,
    ))
}

/// Numeric colour operands (1, 3 or 4 of them); `None` when any operand
/// is not a number, e.g. a pattern name after `scn`.
fn color_operands(operands: &[Object]) -> Option<Color> {
    let components = operands
        .iter()
        .map(|o| object_to_f64(o).ok().map(|v| v as f32))
        .collect::<Option<Vec<f32>>>()?;
    Color::from_components(&components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ImageData;
    use lopdf::{Document, Stream, dictionary};

    #[derive(Default)]
    struct Collecting {
        chars: Vec<CharEvent>,
        paths: Vec<PathEvent>,
        images: Vec<ImageEvent>,
        warnings: Vec<String>,
    }

    impl ContentHandler for Collecting {
        fn on_char(&mut self, event: CharEvent) {
            self.chars.push(event);
        }
        fn on_path_painted(&mut self, event: PathEvent) {
            self.paths.push(event);
        }
        fn on_image(&mut self, event: ImageEvent) {
            self.images.push(event);
        }
        fn on_warning(&mut self, message: String) {
            self.warnings.push(message);
        }
    }

    fn run(doc: &Document, resources: &lopdf::Dictionary, stream: &[u8]) -> Collecting {
        run_with(doc, resources, stream, &RenderOptions::default())
    }

    fn run_with(
        doc: &Document,
        resources: &lopdf::Dictionary,
        stream: &[u8],
        options: &RenderOptions,
    ) -> Collecting {
        let mut handler = Collecting::default();
        let mut state = InterpreterState::with_ctm(Ctm::IDENTITY);
        interpret_content_stream(doc, stream, resources, &mut handler, options, 0, &mut state)
            .unwrap();
        handler
    }

    fn helvetica_resources(doc: &mut Document) -> lopdf::Dictionary {
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        dictionary! { "Font" => dictionary! { "F1" => font } }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn simple_text_boxes() {
        let mut doc = Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let h = run(&doc, &res, b"BT /F1 10 Tf 100 200 Td (Hi) Tj ET");

        assert_eq!(h.chars.len(), 2);
        assert_eq!(h.chars[0].text, "H");
        assert_eq!(h.chars[0].font_name, "F1");
        // H is 722/1000 em wide, box spans descent..ascent
        let r = h.chars[0].rect;
        assert_close(r.x1, 100.0);
        assert_close(r.x2, 107.22);
        assert_close(r.y1, 197.5);
        assert_close(r.y2, 207.5);
        // i starts where H ends
        assert_close(h.chars[1].rect.x1, 107.22);
        assert!(h.warnings.is_empty());
    }

    #[test]
    fn tj_adjustment_moves_next_glyph() {
        let mut doc = Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let h = run(&doc, &res, b"BT /F1 10 Tf [(H) -1000 (i)] TJ ET");
        // 7.22 advance plus one em from the adjustment
        assert_close(h.chars[1].rect.x1, 17.22);
    }

    #[test]
    fn char_and_word_spacing() {
        let mut doc = Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let h = run(&doc, &res, b"BT /F1 10 Tf 1 Tc 5 Tw ( i) Tj ET");
        // space: 2.78 + 1 + 5
        assert_close(h.chars[1].rect.x1, 8.78);
    }

    #[test]
    fn missing_font_warns_and_uses_default_width() {
        let doc = Document::with_version("1.5");
        let h = run(&doc, &lopdf::Dictionary::new(), b"BT /F9 12 Tf (AB) Tj ET");
        assert_eq!(h.chars.len(), 2);
        assert_close(h.chars[1].rect.x1, 6.0);
        assert_eq!(h.warnings.len(), 1);
        assert!(h.warnings[0].contains("/F9"));
    }

    #[test]
    fn ctm_applies_to_text() {
        let mut doc = Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let h = run(&doc, &res, b"2 0 0 2 50 50 cm BT /F1 10 Tf (H) Tj ET");
        let r = h.chars[0].rect;
        assert_close(r.x1, 50.0);
        assert_close(r.x2, 50.0 + 14.44);
        assert_close(r.y2, 50.0 + 15.0);
    }

    #[test]
    fn rectangle_fill_with_colour() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"1 0 0 rg 10 20 30 40 re f 0 0 1 RG 3 w 0 0 m 5 5 l S",
        );
        assert_eq!(h.paths.len(), 2);
        let fill = &h.paths[0];
        assert_eq!(fill.paint_op, PaintOp::Fill);
        assert_eq!(fill.fill_color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(fill.segments.len(), 5);
        assert_eq!(fill.segments[2], PathSegment::LineTo(Point::new(40.0, 60.0)));
        let stroke = &h.paths[1];
        assert_eq!(stroke.paint_op, PaintOp::Stroke);
        assert_eq!(stroke.stroke_color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(stroke.line_width, 3.0);
    }

    #[test]
    fn even_odd_and_discard() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"0 0 10 10 re n 0 0 10 10 re f* 0 0 m 1 1 l b*",
        );
        assert_eq!(h.paths.len(), 2);
        assert_eq!(h.paths[0].fill_rule, FillRule::EvenOdd);
        assert_eq!(h.paths[1].paint_op, PaintOp::FillAndStroke);
        assert_eq!(h.paths[1].segments.last(), Some(&PathSegment::ClosePath));
    }

    #[test]
    fn q_restores_colour_and_ctm() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"q 0.5 g 1 0 0 1 10 10 cm Q 0 0 1 1 re f",
        );
        assert_eq!(h.paths[0].fill_color, Color::BLACK);
        assert_eq!(h.paths[0].ctm, Ctm::IDENTITY);
    }

    #[test]
    fn unbalanced_q_warns() {
        let doc = Document::with_version("1.5");
        let h = run(&doc, &lopdf::Dictionary::new(), b"Q");
        assert_eq!(h.warnings, vec!["unbalanced Q operator ignored".to_string()]);
    }

    #[test]
    fn ext_gstate_opacity() {
        let doc = Document::with_version("1.5");
        let res = dictionary! {
            "ExtGState" => dictionary! {
                "GS1" => dictionary! { "ca" => Object::Real(0.5), "CA" => Object::Real(0.25) },
            },
        };
        let h = run(&doc, &res, b"/GS1 gs 0 0 1 1 re B");
        assert_eq!(h.paths[0].fill_color.a, 0.5);
        assert_eq!(h.paths[0].stroke_color.a, 0.25);
    }

    #[test]
    fn cmyk_and_pattern_colours() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"0 1 1 0 k 0 0 1 1 re f /P1 scn 0 0 1 1 re f",
        );
        assert_eq!(h.paths[0].fill_color, Color::rgb(1.0, 0.0, 0.0));
        // Pattern name leaves the previous colour in place.
        assert_eq!(h.paths[1].fill_color, Color::rgb(1.0, 0.0, 0.0));
    }

    fn image_resources(doc: &mut Document) -> lopdf::Dictionary {
        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0, 255, 0],
        );
        stream.allows_compression = false;
        let img = doc.add_object(stream);
        dictionary! { "XObject" => dictionary! { "Im0" => img } }
    }

    #[test]
    fn image_do_reports_placement_and_pixels() {
        let mut doc = Document::with_version("1.5");
        let res = image_resources(&mut doc);
        let h = run(&doc, &res, b"q 100 0 0 50 20 30 cm /Im0 Do Q");
        assert_eq!(h.images.len(), 1);
        let img = &h.images[0];
        assert_eq!(img.name, "Im0");
        assert_eq!(img.ctm, Ctm::new(100.0, 0.0, 0.0, 50.0, 20.0, 30.0));
        assert_eq!(img.colorspace.as_deref(), Some("DeviceRGB"));
        assert_eq!(
            img.data,
            Some(ImageData {
                width: 1,
                height: 1,
                rgba: vec![0, 255, 0, 255]
            })
        );
    }

    #[test]
    fn missing_xobject_warns() {
        let doc = Document::with_version("1.5");
        let h = run(&doc, &lopdf::Dictionary::new(), b"/Nope Do");
        assert!(h.images.is_empty());
        assert!(h.warnings[0].contains("/Nope"));
    }

    #[test]
    fn hex_filtered_inline_image_is_placed_and_decoded() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"q 100 0 0 50 10 20 cm BI /W 1 /H 1 /CS /DeviceGray /BPC 8 /F /AHx ID 80> EI Q 0 0 1 1 re f",
        );
        assert_eq!(h.images.len(), 1);
        let img = &h.images[0];
        assert_eq!(img.name, "");
        assert_eq!(img.ctm, Ctm::new(100.0, 0.0, 0.0, 50.0, 10.0, 20.0));
        assert_eq!(img.filter.as_deref(), Some("ASCIIHexDecode"));
        assert_eq!(img.data.as_ref().map(|d| d.rgba.clone()), Some(vec![128, 128, 128, 255]));
        // Operators after EI are still interpreted.
        assert_eq!(h.paths.len(), 1);
        assert!(h.warnings.is_empty());
    }

    #[test]
    fn inline_image_with_unsupported_filter_keeps_placement() {
        let doc = Document::with_version("1.5");
        let h = run(
            &doc,
            &lopdf::Dictionary::new(),
            b"BI /W 1 /H 1 /CS /RGB /BPC 8 /F /DCT ID \xFF\xD8 EI",
        );
        assert_eq!(h.images.len(), 1);
        assert_eq!(h.images[0].colorspace.as_deref(), Some("DeviceRGB"));
        assert!(h.images[0].data.is_none());
        assert!(h.warnings[0].contains("inline image not decoded"));
    }

    #[test]
    fn inline_image_named_colour_space_from_resources() {
        let doc = Document::with_version("1.5");
        let res = dictionary! {
            "ColorSpace" => dictionary! {
                "CS0" => vec![
                    Object::from("Indexed"),
                    Object::from("DeviceRGB"),
                    Object::Integer(1),
                    Object::String(vec![0, 0, 0, 0, 0, 255], lopdf::StringFormat::Hexadecimal),
                ],
            },
        };
        let h = run(&doc, &res, b"BI /W 2 /H 1 /CS /CS0 /BPC 8 ID \x00\x01 EI");
        let data = h.images[0].data.as_ref().unwrap();
        assert_eq!(data.rgba, vec![0, 0, 0, 255, 0, 0, 255, 255]);
    }

    fn form_resources(doc: &mut Document, body: &[u8], self_ref: bool) -> lopdf::Dictionary {
        let form_id = doc.new_object_id();
        let inner = if self_ref {
            dictionary! { "XObject" => dictionary! { "Fm0" => form_id } }
        } else {
            image_resources(doc)
        };
        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 5.into(), 7.into()],
                "Resources" => inner,
            },
            body.to_vec(),
        );
        stream.allows_compression = false;
        doc.objects.insert(form_id, Object::Stream(stream));
        dictionary! { "XObject" => dictionary! { "Fm0" => form_id } }
    }

    #[test]
    fn form_xobject_applies_matrix() {
        let mut doc = Document::with_version("1.5");
        let res = form_resources(&mut doc, b"/Im0 Do 0 0 2 2 re f", false);
        let h = run(&doc, &res, b"/Fm0 Do 0 0 1 1 re f");
        assert_eq!(h.images.len(), 1);
        assert_eq!(h.images[0].ctm, Ctm::translate(5.0, 7.0));
        assert_eq!(h.paths[0].ctm, Ctm::translate(5.0, 7.0));
        // State restored after the form.
        assert_eq!(h.paths[1].ctm, Ctm::IDENTITY);
    }

    #[test]
    fn recursive_form_stops_at_limit() {
        let mut doc = Document::with_version("1.5");
        let res = form_resources(&mut doc, b"0 0 1 1 re f /Fm0 Do", true);
        let options = RenderOptions {
            max_recursion_depth: 3,
            ..RenderOptions::default()
        };
        let h = run_with(&doc, &res, b"/Fm0 Do", &options);
        // Depths 1, 2 and 3 paint; the fourth level is skipped.
        assert_eq!(h.paths.len(), 3);
        assert!(h.warnings.iter().any(|w| w.contains("nesting deeper than 3")));
    }

    #[test]
    fn depth_above_limit_is_an_error() {
        let doc = Document::with_version("1.5");
        let options = RenderOptions {
            max_recursion_depth: 2,
            ..RenderOptions::default()
        };
        let mut state = InterpreterState::with_ctm(Ctm::IDENTITY);
        let err = interpret_content_stream(
            &doc,
            b"",
            &lopdf::Dictionary::new(),
            &mut Collecting::default(),
            &options,
            3,
            &mut state,
        )
        .unwrap_err();
        assert!(err.to_string().contains("recursion depth 3"));
    }

    #[test]
    fn glyph_box_uses_rect_ordering() {
        // Negative font size flips the glyph; the box is still ordered.
        let mut doc = Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let h = run(&doc, &res, b"BT /F1 -10 Tf 0 100 Td (H) Tj ET");
        let r: Rect = h.chars[0].rect;
        assert!(r.x1 <= r.x2 && r.y1 <= r.y2);
    }
}
