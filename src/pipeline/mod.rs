//! I/O stages around the pagination core.
//!
//! ## Data Flow
//!
//! ```text
//! analyze:      input ──▶ extract ──▶ (encode) ──▶ llm ──▶ FieldMap
//! translate:    FieldMap ──▶ translate ──▶ FieldMap
//! generate-pdf: FieldMap ──▶ html ──▶ raster ──▶ paginate ──▶ PDF bytes
//! ```
//!
//! 1. [`input`]     canonicalise a path, URL or upload to a local file
//! 2. [`extract`]   pdfium text extraction and page rasterisation
//!    (`spawn_blocking`, pdfium is not async-safe)
//! 3. [`encode`]    PNG + base64 for scanned pages sent as images
//! 4. [`llm`]       provider chat with timeout and retry/backoff
//! 5. [`translate`] recursive, bounded fan-out over a field mapping
//! 6. [`html`]      field mapping to styled report HTML
//! 7. [`raster`]    report HTML to a tall bitmap via headless Chromium

pub mod encode;
pub mod extract;
pub mod html;
pub mod input;
pub mod llm;
pub mod raster;
pub mod translate;
