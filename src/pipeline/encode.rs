//! Scanned-page encoding: `DynamicImage` → base64 PNG `ImageData`.
//!
//! Used only for the vision fallback, when a tender PDF has no text layer.
//! PNG keeps small print (EMD amounts, clause numbers) crisp, which matters
//! more here than request size.

use crate::error::ReportError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode one scanned page for a multimodal chat message.
pub fn encode_scan(page: &DynamicImage) -> Result<ImageData, ReportError> {
    let mut png = Vec::new();
    page.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ReportError::Internal(format!("PNG encoding failed: {e}")))?;

    let b64 = STANDARD.encode(&png);
    debug!("Encoded {}x{} scan → {} bytes base64", page.width(), page.height(), b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Encode every page, stopping at the first failure.
pub fn encode_scans(pages: &[DynamicImage]) -> Result<Vec<ImageData>, ReportError> {
    pages.iter().map(encode_scan).collect()
}
