use std::path::Path;

use pdfpage::{Document, PdfPage, Rect};

use crate::page_range::parse_page_range;

/// Open a PDF file with user-friendly error messages.
///
/// Returns `Err(1)` with a message printed to stderr if the file is not found
/// or cannot be parsed as a valid PDF.
pub fn open_pdf(file: &Path) -> Result<Document, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }

    Document::open_file(file).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Resolve an optional page range string into 1-based page numbers.
///
/// If `pages` is `None`, returns every page of the document.
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<Vec<usize>, i32> {
    match pages {
        Some(range) => parse_page_range(range, page_count).map_err(|e| {
            eprintln!("Error: {e}");
            1
        }),
        None => Ok((1..=page_count).collect()),
    }
}

pub fn open_page(doc: &Document, index: usize) -> Result<PdfPage, i32> {
    doc.open_page(index).map_err(|e| {
        eprintln!("Error reading page {index}: {e}");
        1
    })
}

pub fn format_rect(r: &Rect) -> String {
    format!("[{:.4}, {:.4}, {:.4}, {:.4}]", r.x1, r.y1, r.x2, r.y2)
}

pub fn rect_to_json(r: &Rect) -> serde_json::Value {
    serde_json::json!({ "x1": r.x1, "y1": r.y1, "x2": r.x2, "y2": r.y2 })
}

pub fn print_json(value: &serde_json::Value) -> Result<(), i32> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        eprintln!("Error: failed to serialize JSON: {e}");
        1
    })?;
    println!("{text}");
    Ok(())
}
