use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use pdfpage::{AlphaMode, PageRenderer, RenderOptions, RenderResult};
use tracing::info;

use crate::shared::{open_page, open_pdf, resolve_pages};

pub fn run(
    file: &Path,
    pages: Option<&str>,
    dpi: f64,
    output: &Path,
    transparent: bool,
) -> Result<(), i32> {
    let doc = open_pdf(file)?;
    let indices = resolve_pages(pages, doc.page_count())?;

    std::fs::create_dir_all(output).map_err(|e| {
        eprintln!("Error: cannot create {}: {e}", output.display());
        1
    })?;

    let renderer = PageRenderer::new(RenderOptions {
        alpha: if transparent {
            AlphaMode::Preserve
        } else {
            AlphaMode::Flatten
        },
        straight_alpha: transparent,
        ..RenderOptions::default()
    });

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());

    for index in indices {
        let page = open_page(&doc, index)?;
        let result = renderer.render(&page, dpi).map_err(|e| {
            eprintln!("Error rendering page {index}: {e}");
            1
        })?;
        let path = output_path(output, &stem, index);
        write_png(&path, &result).map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;
        info!(page = index, width = result.width, height = result.height, path = %path.display(), "wrote PNG");
        println!("{}", path.display());
    }
    Ok(())
}

fn output_path(dir: &Path, stem: &str, index: usize) -> PathBuf {
    dir.join(format!("{stem}-{index}.png"))
}

/// Encode a packed RGB or straight-alpha RGBA buffer as PNG.
fn write_png(path: &Path, image: &RenderResult) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(if image.has_alpha {
        png::ColorType::Rgba
    } else {
        png::ColorType::Rgb
    });
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("failed to write PNG header: {e}"))?;

    let row_len = image.width as usize * image.channels();
    let data: Vec<u8> = if image.stride == row_len {
        image.pixels.clone()
    } else {
        image
            .pixels
            .chunks(image.stride)
            .flat_map(|row| &row[..row_len])
            .copied()
            .collect()
    };
    writer
        .write_image_data(&data)
        .map_err(|e| format!("failed to write PNG data: {e}"))?;
    Ok(())
}
