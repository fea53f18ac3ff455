use std::path::Path;

use pdfpage::{PageError, Rect, SearchOptions, locate};

use crate::cli::OutputFormat;
use crate::shared::{format_rect, open_page, open_pdf, print_json, rect_to_json, resolve_pages};

pub struct FindArgs<'a> {
    pub query: &'a str,
    pub points: bool,
    pub regex: bool,
    pub case_sensitive: bool,
}

pub fn run(
    file: &Path,
    pages: Option<&str>,
    format: OutputFormat,
    args: &FindArgs<'_>,
) -> Result<(), i32> {
    let doc = open_pdf(file)?;
    let indices = resolve_pages(pages, doc.page_count())?;
    let options = SearchOptions {
        regex: args.regex,
        case_sensitive: args.case_sensitive,
    };

    let mut hits_json = Vec::new();
    let mut total = 0;
    for index in indices {
        let page = open_page(&doc, index)?;
        let rects = page_hits(&page, args, &options).map_err(|e| {
            eprintln!("Error: searching page {index}: {e}");
            1
        })?;
        total += rects.len();
        for rect in rects {
            match format {
                OutputFormat::Text => println!("{index}\t{}", format_rect(&rect)),
                OutputFormat::Json => {
                    let mut hit = rect_to_json(&rect);
                    hit["page"] = serde_json::json!(index);
                    hits_json.push(hit);
                }
            }
        }
    }

    match format {
        OutputFormat::Text => {
            if total == 0 {
                eprintln!("No matches for '{}'", args.query);
            }
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "query": args.query,
            "normalized": !args.points,
            "hits": hits_json,
        })),
    }
}

/// Hit rectangles for one page, normalized unless `--points` was given.
fn page_hits(
    page: &pdfpage::PdfPage,
    args: &FindArgs<'_>,
    options: &SearchOptions,
) -> Result<Vec<Rect>, PageError> {
    let search = |query: &str| -> Result<Vec<Rect>, PageError> {
        Ok(page
            .find_text_with(query, options)?
            .into_iter()
            .map(|m| m.rect)
            .collect())
    };
    if args.points {
        search(args.query)
    } else {
        locate::find_by(page, args.query, search)
    }
}
