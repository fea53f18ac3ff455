//! lopdf-based PDF parsing backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate for document parsing.

use pdfpage_core::{Ctm, Rect, RenderOptions};
use tracing::debug;

use crate::backend::PdfBackend;
use crate::error::BackendError;
use crate::handler::ContentHandler;
use crate::interpreter::interpret_content_stream;
use crate::interpreter_state::InterpreterState;

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page object ids in document order (0-based).
    page_ids: Vec<lopdf::ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A reference to a single page within a [`LopdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct LopdfPage {
    /// The lopdf object ID for this page.
    pub object_id: lopdf::ObjectId,
    /// The 0-based page index.
    pub index: usize,
}

/// The lopdf-based PDF backend.
pub struct LopdfBackend;

/// Extract a [`Rect`] from a 4-number array `[x1 y1 x2 y2]`.
fn extract_rect_from_array(doc: &lopdf::Document, array: &[lopdf::Object]) -> Result<Rect, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let v = |i: usize| object_to_f64(resolve_ref(doc, &array[i]));
    Ok(Rect::new(v(0)?, v(1)?, v(2)?, v(3)?))
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Result<f64, BackendError> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(f) => Ok(f64::from(*f)),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Follow one level of indirection; unresolvable references are returned as is.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, BackendError> {
    let mut current_id = page_id;
    // Bounded walk: a malformed tree may contain a /Parent cycle.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve_ref(doc, value)));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain too deep".to_string()))
}

fn page_dict(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> Result<&lopdf::Dictionary, BackendError> {
    doc.get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = LopdfPage;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "encrypted documents are not supported".to_string(),
            ));
        }

        // get_pages returns a BTreeMap keyed by 1-based page number.
        let page_ids: Vec<lopdf::ObjectId> = inner.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "opened PDF document");

        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
        let object_id = doc.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                doc.page_ids.len()
            ))
        })?;
        Ok(LopdfPage { object_id, index })
    }

    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<Rect, Self::Error> {
        let obj = resolve_inherited(&doc.inner, page.object_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
        let array = obj
            .as_array()
            .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
        extract_rect_from_array(&doc.inner, array)
    }

    fn page_crop_box(doc: &Self::Document, page: &Self::Page) -> Result<Option<Rect>, Self::Error> {
        match resolve_inherited(&doc.inner, page.object_id, b"CropBox")? {
            Some(obj) => {
                let array = obj
                    .as_array()
                    .map_err(|e| BackendError::Parse(format!("CropBox is not an array: {e}")))?;
                Ok(Some(extract_rect_from_array(&doc.inner, array)?))
            }
            None => Ok(None),
        }
    }

    fn page_rotate(doc: &Self::Document, page: &Self::Page) -> Result<i32, Self::Error> {
        match resolve_inherited(&doc.inner, page.object_id, b"Rotate")? {
            Some(obj) => {
                let degrees = obj
                    .as_i64()
                    .map_err(|e| BackendError::Parse(format!("/Rotate is not an integer: {e}")))?;
                Ok(degrees.rem_euclid(360) as i32)
            }
            None => Ok(0),
        }
    }

    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        options: &RenderOptions,
    ) -> Result<(), Self::Error> {
        let inner = &doc.inner;
        let dict = page_dict(inner, page.object_id)?;
        let content_bytes = get_page_content_bytes(inner, dict)?;
        let resources = get_page_resources(inner, page.object_id)?;

        // Events are reported relative to the MediaBox's lower-left corner.
        let media_box = Self::page_media_box(doc, page)?;
        let mut state = InterpreterState::with_ctm(Ctm::translate(-media_box.x1, -media_box.y1));

        interpret_content_stream(inner, &content_bytes, resources, handler, options, 0, &mut state)
    }
}

/// Concatenated, decoded `/Contents` of a page.
fn get_page_content_bytes(
    doc: &lopdf::Document,
    page_dict: &lopdf::Dictionary,
) -> Result<Vec<u8>, BackendError> {
    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => resolve_ref(doc, obj),
        Err(_) => return Ok(Vec::new()),
    };

    match contents_obj {
        lopdf::Object::Stream(stream) => decode_content_stream(stream),
        lopdf::Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve_ref(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_content_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Decode a content stream, decompressing if needed.
fn decode_content_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// The resources dictionary for a page, handling inheritance.
fn get_page_resources(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<&lopdf::Dictionary, BackendError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => {
            static EMPTY_DICT: std::sync::LazyLock<lopdf::Dictionary> =
                std::sync::LazyLock::new(lopdf::Dictionary::new);
            Ok(&EMPTY_DICT)
        }
    }
}

#[cfg(test)]
fn save(mut doc: lopdf::Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Build a document from page dictionaries; `/Parent` is filled in.
#[cfg(test)]
fn create_test_pdf_with_pages(
    doc: &mut lopdf::Document,
    pages: Vec<lopdf::Dictionary>,
    pages_extra: lopdf::Dictionary,
) {
    use lopdf::{Object, ObjectId, dictionary};

    let pages_id: ObjectId = doc.new_object_id();
    let count = pages.len() as i64;
    let kids: Vec<Object> = pages
        .into_iter()
        .map(|mut p| {
            p.set("Type", "Page");
            p.set("Parent", pages_id);
            doc.add_object(p).into()
        })
        .collect();

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    for (k, v) in pages_extra {
        pages_dict.set(k, v);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Minimal US Letter pages with no content.
#[cfg(test)]
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    use lopdf::{Document, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages = (0..page_count)
        .map(|_| dictionary! { "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()] })
        .collect();
    create_test_pdf_with_pages(&mut doc, pages, lopdf::Dictionary::new());
    save(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CharEvent, ImageEvent, PathEvent};
    use lopdf::{Document, Object, Stream, dictionary};

    #[derive(Default)]
    struct Collecting {
        chars: Vec<CharEvent>,
        paths: Vec<PathEvent>,
        images: Vec<ImageEvent>,
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
    }

    fn open(bytes: &[u8]) -> LopdfDocument {
        LopdfBackend::open(bytes).unwrap()
    }

    #[test]
    fn open_counts_pages() {
        let doc = open(&create_test_pdf(3));
        assert_eq!(LopdfBackend::page_count(&doc), 3);
        assert_eq!(LopdfBackend::get_page(&doc, 2).unwrap().index, 2);
        assert!(LopdfBackend::get_page(&doc, 3).is_err());
    }

    #[test]
    fn open_rejects_garbage() {
        let err = LopdfBackend::open(b"not a pdf").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn media_box_on_page() {
        let doc = open(&create_test_pdf(1));
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        assert_eq!(
            LopdfBackend::page_media_box(&doc, &page).unwrap(),
            Rect::from_size(612.0, 792.0)
        );
        assert_eq!(LopdfBackend::page_crop_box(&doc, &page).unwrap(), None);
        assert_eq!(LopdfBackend::page_rotate(&doc, &page).unwrap(), 0);
    }

    #[test]
    fn media_box_and_rotate_inherited() {
        let mut doc = Document::with_version("1.5");
        create_test_pdf_with_pages(
            &mut doc,
            vec![lopdf::Dictionary::new()],
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Rotate" => -90,
            },
        );
        let doc = open(&save(doc));
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        assert_eq!(
            LopdfBackend::page_media_box(&doc, &page).unwrap(),
            Rect::from_size(595.0, 842.0)
        );
        assert_eq!(LopdfBackend::page_rotate(&doc, &page).unwrap(), 270);
    }

    #[test]
    fn crop_box_is_read() {
        let mut doc = Document::with_version("1.5");
        create_test_pdf_with_pages(
            &mut doc,
            vec![dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "CropBox" => vec![
                    Object::Real(36.0), Object::Real(36.0),
                    Object::Real(576.0), Object::Real(756.0),
                ],
            }],
            lopdf::Dictionary::new(),
        );
        let doc = open(&save(doc));
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        assert_eq!(
            LopdfBackend::page_crop_box(&doc, &page).unwrap(),
            Some(Rect::new(36.0, 36.0, 576.0, 756.0))
        );
    }

    #[test]
    fn crop_box_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        create_test_pdf_with_pages(
            &mut doc,
            vec![
                lopdf::Dictionary::new(),
                dictionary! { "CropBox" => vec![0.into(), 0.into(), 100.into(), 100.into()] },
            ],
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "CropBox" => vec![10.into(), 20.into(), 300.into(), 400.into()],
            },
        );
        let doc = open(&save(doc));
        let first = LopdfBackend::get_page(&doc, 0).unwrap();
        assert_eq!(
            LopdfBackend::page_crop_box(&doc, &first).unwrap(),
            Some(Rect::new(10.0, 20.0, 300.0, 400.0))
        );
        // The page's own box wins over the inherited one.
        let second = LopdfBackend::get_page(&doc, 1).unwrap();
        assert_eq!(
            LopdfBackend::page_crop_box(&doc, &second).unwrap(),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
    }

    #[test]
    fn missing_media_box_is_an_error() {
        let mut doc = Document::with_version("1.5");
        create_test_pdf_with_pages(&mut doc, vec![lopdf::Dictionary::new()], lopdf::Dictionary::new());
        let doc = open(&save(doc));
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        assert!(LopdfBackend::page_media_box(&doc, &page).is_err());
    }

    fn page_with_content(media_box: Vec<Object>, contents: Vec<&[u8]>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let font = doc.add_object(dictionary! {
            "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
        });
        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font },
        });
        let streams: Vec<Object> = contents
            .into_iter()
            .map(|c| doc.add_object(Stream::new(lopdf::Dictionary::new(), c.to_vec())).into())
            .collect();
        create_test_pdf_with_pages(
            &mut doc,
            vec![dictionary! {
                "MediaBox" => media_box,
                "Resources" => resources,
                "Contents" => streams,
            }],
            lopdf::Dictionary::new(),
        );
        save(doc)
    }

    #[test]
    fn interpret_concatenates_content_array() {
        let bytes = page_with_content(
            vec![0.into(), 0.into(), 612.into(), 792.into()],
            vec![b"BT /F1 12 Tf 72 700 Td (Hi) Tj ET", b"0 0 10 10 re f"],
        );
        let doc = open(&bytes);
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        let mut h = Collecting::default();
        LopdfBackend::interpret_page(&doc, &page, &mut h, &RenderOptions::default()).unwrap();
        assert_eq!(h.chars.len(), 2);
        assert_eq!(h.paths.len(), 1);
        assert!(h.images.is_empty());
        assert_eq!(h.chars[0].rect.x1, 72.0);
    }

    #[test]
    fn interpret_offsets_by_media_box_origin() {
        let bytes = page_with_content(
            vec![100.into(), 200.into(), 712.into(), 992.into()],
            vec![b"BT /F1 10 Tf 110 210 Td (H) Tj ET"],
        );
        let doc = open(&bytes);
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        let mut h = Collecting::default();
        LopdfBackend::interpret_page(&doc, &page, &mut h, &RenderOptions::default()).unwrap();
        let r = h.chars[0].rect;
        assert!((r.x1 - 10.0).abs() < 1e-9);
        assert!((r.y1 - 7.5).abs() < 1e-9);
    }

    #[test]
    fn page_without_contents_is_empty() {
        let doc = open(&create_test_pdf(1));
        let page = LopdfBackend::get_page(&doc, 0).unwrap();
        let mut h = Collecting::default();
        LopdfBackend::interpret_page(&doc, &page, &mut h, &RenderOptions::default()).unwrap();
        assert!(h.chars.is_empty() && h.paths.is_empty());
    }

    #[test]
    fn debug_shows_page_count() {
        let doc = open(&create_test_pdf(2));
        assert!(format!("{doc:?}").contains("page_count: 2"));
    }
}
