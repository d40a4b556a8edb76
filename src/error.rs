//! Error types for the bid-report library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`] is **fatal**: the request cannot produce a result at all
//!   (unreadable input, analyzer unreachable, render produced nothing, every
//!   page of the report was blank). Returned as `Err(ReportError)` from the
//!   top-level [`crate::service`] functions. No partial artifact is ever
//!   returned alongside it.
//!
//! * [`TranslationError`] is **non-fatal**: a single leaf string failed to
//!   translate. The fan-out in [`crate::pipeline::translate`] swallows it and
//!   keeps the original text for that leaf, so sibling keys are unaffected.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the bid-report library.
///
/// Per-leaf translation failures use [`TranslationError`] and never
/// propagate here.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is neither a PDF nor a plain-text document.
    #[error("Unsupported document '{path}': expected a PDF or .txt file (first bytes: {magic:?})")]
    UnsupportedInput { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// A required request field (question, context, data) was absent or empty.
    #[error("Missing input: {0}")]
    MissingInput(String),

    // ── Upstream service errors ───────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Analyzer / answering call failed or timed out after all retries.
    #[error("{service} call failed after {attempts} attempt(s): {detail}")]
    UpstreamService {
        service: String,
        attempts: u32,
        detail: String,
    },

    /// The analyzer reply is not valid structured data after fence-stripping.
    #[error("Analyzer response is not a valid field mapping: {detail}")]
    Parse { detail: String },

    // ── Report pipeline errors ────────────────────────────────────────────
    /// HTML rasterisation produced no usable image.
    #[error("HTML render failed: {0}")]
    Render(String),

    /// Every crop of the rendered report was blank; refusing to emit a
    /// zero-page document.
    #[error("Pagination produced no pages: all {crops} crop(s) of the {width}x{height} render were blank")]
    PaginationEmpty { crops: usize, width: u32, height: u32 },

    /// Serialising the multi-page PDF failed.
    #[error("PDF serialisation failed: {0}")]
    Serialize(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp-file or other local I/O failed.
    #[error("I/O error during {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Wrap an `std::io::Error` with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ReportError::Io {
            context: context.into(),
            source,
        }
    }
}

/// A non-fatal error for a single translated leaf.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// The HTTP request never completed (connect error, timeout, …).
    #[error("translation request failed: {0}")]
    Request(String),

    /// The translation service answered with a non-success status.
    #[error("translation service returned HTTP {0}")]
    Status(u16),

    /// The reply body could not be interpreted.
    #[error("malformed translation response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_empty_display() {
        let e = ReportError::PaginationEmpty {
            crops: 5,
            width: 1240,
            height: 7016,
        };
        let msg = e.to_string();
        assert!(msg.contains("5 crop(s)"), "got: {msg}");
        assert!(msg.contains("1240x7016"), "got: {msg}");
    }

    #[test]
    fn upstream_display_names_service() {
        let e = ReportError::UpstreamService {
            service: "analysis".into(),
            attempts: 3,
            detail: "503 overloaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("analysis call failed after 3 attempt(s)"));
        assert!(msg.contains("503 overloaded"));
    }

    #[test]
    fn io_helper_keeps_context() {
        let e = ReportError::io(
            "writing upload",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(e.to_string().contains("writing upload"));
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn translation_status_display() {
        assert_eq!(
            TranslationError::Status(429).to_string(),
            "translation service returned HTTP 429"
        );
    }
}
