//! Fixture PDFs built with lopdf.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// One page of a fixture document.
pub struct PageSpec {
    pub media_box: [i64; 4],
    pub content: Vec<u8>,
    /// 8-bit DeviceRGB samples registered as `/Im0`.
    pub image: Option<(u32, u32, Vec<u8>)>,
}

impl PageSpec {
    pub fn new(width: i64, height: i64, content: &str) -> Self {
        Self {
            media_box: [0, 0, width, height],
            content: content.as_bytes().to_vec(),
            image: None,
        }
    }

    pub fn with_image(mut self, width: u32, height: u32, rgb: Vec<u8>) -> Self {
        self.image = Some((width, height, rgb));
        self
    }
}

/// Build a document whose pages share a Helvetica `/F1`.
pub fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let count = pages.len() as i64;
    let mut kids = Vec::new();
    for spec in pages {
        let mut stream = Stream::new(dictionary! {}, spec.content);
        stream.allows_compression = false;
        let content_id = doc.add_object(stream);

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if let Some((w, h, rgb)) = spec.image {
            let mut image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w as i64,
                    "Height" => h as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                rgb,
            );
            image.allows_compression = false;
            let image_id = doc.add_object(image);
            resources.set("XObject", dictionary! { "Im0" => image_id });
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => spec.media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}

/// A 200x200 pt page with a red square, a line of text, and a 2x2 image
/// in the bottom-left quarter.
pub fn sample_pdf() -> Vec<u8> {
    // Rows top to bottom: red green / blue white.
    let rgb = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    build_pdf(vec![
        PageSpec::new(
            200,
            200,
            "1 0 0 rg 100 100 50 50 re f \
             BT /F1 12 Tf 20 180 Td (Total) Tj ET \
             q 100 0 0 100 0 0 cm /Im0 Do Q",
        )
        .with_image(2, 2, rgb),
    ])
}
