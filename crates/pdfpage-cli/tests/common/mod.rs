//! Fixture PDFs for CLI tests.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use lopdf::{Document, Object, Stream, dictionary};

pub fn cmd() -> Command {
    Command::cargo_bin("pdfpage").unwrap()
}

/// Pages of `(width, height, content)` sharing a Helvetica `/F1` and a 1x1
/// red DeviceRGB image `/Im0`.
pub fn build_pdf(pages: &[(i64, i64, &str)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![255, 0, 0],
    );
    image.allows_compression = false;
    let image_id = doc.add_object(image);

    let mut kids = Vec::new();
    for &(width, height, content) in pages {
        let mut stream = Stream::new(dictionary! {}, content.as_bytes().to_vec());
        stream.allows_compression = false;
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len() as i64;
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
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write `bytes` to `name` inside `dir`.
pub fn write_pdf(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Two pages: 612x792 with text and an image, then 200x100 with text only.
pub fn two_page_pdf(dir: &tempfile::TempDir) -> PathBuf {
    let bytes = build_pdf(&[
        (
            612,
            792,
            "BT /F1 12 Tf 36 36 Td (Invoice Total) Tj ET q 72 0 0 72 300 400 cm /Im0 Do Q",
        ),
        (200, 100, "BT /F1 10 Tf 10 10 Td (total due) Tj ET"),
    ]);
    write_pdf(dir, "sample.pdf", &bytes)
}
