//! PDF reading via pdfium: text from the first pages, and page images for
//! scanned documents.
//!
//! pdfium is a C++ library with thread-local state and is not safe to drive
//! from async tasks, so both entry points run inside `spawn_blocking`.

use crate::error::ReportError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Concatenate the text of the first `page_limit` pages, one page per line
/// block.
pub async fn extract_text(pdf_path: &Path, page_limit: usize) -> Result<String, ReportError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path, page_limit))
        .await
        .map_err(|e| ReportError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Rasterise the first `page_limit` pages, longest edge capped at
/// `max_pixels`.
pub async fn render_pages(
    pdf_path: &Path,
    page_limit: usize,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, ReportError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || render_pages_blocking(&path, page_limit, max_pixels))
        .await
        .map_err(|e| ReportError::Internal(format!("Render task panicked: {}", e)))?
}

fn open<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, ReportError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ReportError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

fn extract_text_blocking(pdf_path: &Path, page_limit: usize) -> Result<String, ReportError> {
    let pdfium = Pdfium::default();
    let document = open(&pdfium, pdf_path)?;
    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages, reading text from {}", total, total.min(page_limit));

    let mut text = String::new();
    for (idx, page) in pages.iter().take(page_limit).enumerate() {
        match page.text() {
            Ok(page_text) => {
                let content = page_text.all();
                debug!("Page {}: {} chars of text", idx + 1, content.len());
                if !content.is_empty() {
                    text.push_str(&content);
                    text.push('\n');
                }
            }
            Err(e) => warn!("Page {}: text layer unreadable ({:?})", idx + 1, e),
        }
    }

    Ok(text)
}

fn render_pages_blocking(
    pdf_path: &Path,
    page_limit: usize,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, ReportError> {
    let pdfium = Pdfium::default();
    let document = open(&pdfium, pdf_path)?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::new();
    for (idx, page) in document.pages().iter().take(page_limit).enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ReportError::Render(format!("page {}: {:?}", idx + 1, e)))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    if images.is_empty() {
        return Err(ReportError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: "document has no pages".into(),
        });
    }
    Ok(images)
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// True when extracted text is long enough to analyse without images.
pub fn has_usable_text(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() > min_chars
}
