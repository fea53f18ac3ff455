use std::path::Path;

use pdfpage::PageHandle;

use crate::cli::OutputFormat;
use crate::shared::{format_rect, open_page, open_pdf, print_json, rect_to_json, resolve_pages};

pub fn run(file: &Path, pages: Option<&str>, format: OutputFormat) -> Result<(), i32> {
    let doc = open_pdf(file)?;
    let page_count = doc.page_count();
    let indices = resolve_pages(pages, page_count)?;

    let mut page_infos = Vec::new();
    for index in indices {
        let page = open_page(&doc, index)?;
        let (width, height) = page.dimensions();
        match format {
            OutputFormat::Text => {
                println!("Page {index}:");
                println!("  Dimensions: {width:.2} x {height:.2}");
                println!("  Rotation: {}", page.rotation());
                println!("  CropBox: {}", format_rect(&page.crop_box()));
                println!("  Chars: {}", page.chars().len());
                println!("  Images: {}", page.images().len());
                if !page.warnings().is_empty() {
                    println!("  Warnings: {}", page.warnings().len());
                }
            }
            OutputFormat::Json => page_infos.push(serde_json::json!({
                "page": index,
                "width": width,
                "height": height,
                "rotation": page.rotation(),
                "crop_box": rect_to_json(&page.crop_box()),
                "chars": page.chars().len(),
                "images": page.images().len(),
                "warnings": page.warnings(),
            })),
        }
    }

    match format {
        OutputFormat::Text => {
            println!();
            println!("Pages: {page_count}");
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "page_count": page_count,
            "pages": page_infos,
        })),
    }
}
