use std::path::Path;

use pdfpage::locate;

use crate::cli::OutputFormat;
use crate::shared::{format_rect, open_page, open_pdf, print_json, rect_to_json, resolve_pages};

pub fn run(file: &Path, pages: Option<&str>, format: OutputFormat) -> Result<(), i32> {
    let doc = open_pdf(file)?;
    let indices = resolve_pages(pages, doc.page_count())?;

    let mut images_json = Vec::new();
    for index in indices {
        let page = open_page(&doc, index)?;
        let rects = locate::list_images(&page);
        for (rect, meta) in rects.iter().zip(page.images()) {
            match format {
                OutputFormat::Text => println!(
                    "{index}\t{}\t{}x{}\t{}",
                    format_rect(rect),
                    meta.src_width,
                    meta.src_height,
                    meta.name
                ),
                OutputFormat::Json => {
                    let mut entry = rect_to_json(rect);
                    entry["page"] = serde_json::json!(index);
                    entry["name"] = serde_json::json!(meta.name);
                    entry["src_width"] = serde_json::json!(meta.src_width);
                    entry["src_height"] = serde_json::json!(meta.src_height);
                    entry["color_space"] = serde_json::json!(meta.color_space);
                    images_json.push(entry);
                }
            }
        }
    }

    match format {
        OutputFormat::Text => Ok(()),
        OutputFormat::Json => print_json(&serde_json::json!({ "images": images_json })),
    }
}
