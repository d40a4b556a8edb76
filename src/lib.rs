//! # bid-report
//!
//! Extract structured fields from tender documents with an LLM, translate
//! them, and render them back into a paginated PDF report.
//!
//! The interesting part is the paginator. A report is rendered once as a
//! single tall bitmap; [`paginate`] then splits it into fixed-size pages at
//! visually safe rows (blank space or table borders) instead of slicing at
//! fixed offsets, drops pages that came out blank, and writes the rest as a
//! multi-page PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! tender.pdf / .txt / URL
//!  │
//!  ├─ analyze       text layer (or page images) → LLM → FieldMap
//!  ├─ translate     FieldMap → FieldMap, leaf by leaf, bounded fan-out
//!  └─ generate-pdf  FieldMap → HTML → tall PNG (Chromium)
//!                     → RowClassifier / CutPointFinder / PageSlicer
//!                     → PageCompositor → PDF bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bid_report::{analyze_document, generate_pdf_chrome, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ...
//!     let config = ReportConfig::default();
//!     let analysis = analyze_document("tender.pdf", &config).await?;
//!     let pdf = generate_pdf_chrome(&analysis.fields, &config).await?;
//!     std::fs::write("report.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! Paginating an existing render needs neither an LLM nor a browser:
//!
//! ```rust
//! use bid_report::{paginate::paginate, ReportConfig, ReportError};
//! use image::{DynamicImage, Rgb, RgbImage};
//!
//! let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(1240, 3508, Rgb([255, 255, 255])));
//! let err = paginate(&blank, &ReportConfig::default()).unwrap_err();
//! assert!(matches!(err, ReportError::PaginationEmpty { .. }));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bidreport` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## External tools
//!
//! - **pdfium** is loaded at runtime for text extraction and scanned-page
//!   rendering (`PDFIUM_LIB_PATH` or the platform default location).
//! - **Chromium** (or Chrome) renders the report HTML. Set `chrome_path` if
//!   it is not on `PATH` under a usual name.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fields;
pub mod paginate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageGeometry, ReportConfig, ReportConfigBuilder, ScanTuning};
pub use error::{ReportError, TranslationError};
pub use fields::{parse_analysis, FieldMap, FieldValue};
pub use paginate::{CutKind, PageCompositor, PageSlicer};
pub use pipeline::raster::{ChromeRasterizer, HtmlRasterizer};
pub use pipeline::translate::{GoogleTranslator, TextTranslator};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback};
pub use service::{
    analyze_bytes, analyze_document, ask_question, generate_pdf, generate_pdf_chrome,
    generate_pdf_to_file, health, paginate_image, translate_fields, translate_fields_google,
    Analysis, AnalysisSource, Health,
};
