//! Configuration types for analysis, translation and report pagination.
//!
//! All behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. The pagination constants live in two small `Copy`
//! structs, [`PageGeometry`] and [`ScanTuning`], so the paginator can be used
//! on its own without dragging in LLM settings.
//!
//! The row-scan thresholds were chosen for one render resolution (A4 at
//! roughly 150 DPI, 1240 × 1754 px). They are all named here so a page-size
//! change is a one-line edit.

use crate::error::ReportError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Page width of the rendered report, in pixels.
pub const A4_WIDTH_PX: u32 = 1240;
/// Page height of the rendered report, in pixels.
pub const A4_HEIGHT_PX: u32 = 1754;

/// Pixels skipped on each horizontal edge when sampling a row.
pub const ROW_EDGE_MARGIN: u32 = 100;
/// Horizontal distance between sampled pixels.
pub const ROW_SAMPLE_STRIDE: u32 = 50;
/// Maximum brightness deviation (sum of RGB channels) from the first sample
/// for a row to count as uniform.
pub const UNIFORM_TOLERANCE: u16 = 30;
/// Uniform rows brighter than this (out of 765) are blank; darker uniform
/// rows are borders.
pub const BLANK_BRIGHTNESS: u16 = 700;
/// A cut never lands closer than this to the top of the current page.
pub const MIN_PAGE_HEIGHT: u32 = 100;
/// How far above the hard page limit the cut scan may look.
pub const SCAN_LOOKBACK: u32 = 600;
/// Vertical step between scanned rows.
pub const SCAN_STEP: u32 = 2;

/// Fixed output page size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH_PX,
            height: A4_HEIGHT_PX,
        }
    }
}

/// Thresholds for row classification and the cut-point scan window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTuning {
    pub edge_margin: u32,
    pub sample_stride: u32,
    pub tolerance: u16,
    pub blank_brightness: u16,
    pub min_page_height: u32,
    pub lookback: u32,
    pub step: u32,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self {
            edge_margin: ROW_EDGE_MARGIN,
            sample_stride: ROW_SAMPLE_STRIDE,
            tolerance: UNIFORM_TOLERANCE,
            blank_brightness: BLANK_BRIGHTNESS,
            min_page_height: MIN_PAGE_HEIGHT,
            lookback: SCAN_LOOKBACK,
            step: SCAN_STEP,
        }
    }
}

/// Configuration for the full analyze → translate → render → paginate flow.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use bid_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .model("gemini-2.5-flash")
///     .translate_map_workers(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.geometry.width, 1240);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// Output page size. Default: 1240 × 1754 px.
    pub geometry: PageGeometry,

    /// Row-scan thresholds used by the paginator.
    pub tuning: ScanTuning,

    /// Height of the viewport the HTML report is rasterised into. Default:
    /// four pages (7016 px). Content beyond it is clipped by the browser;
    /// blank space below the content is dropped by the paginator.
    pub render_height: u32,

    /// Resolution written into the PDF, used to convert pixels to points.
    /// Default: 100 DPI.
    pub pdf_resolution: f32,

    /// JPEG quality for page images embedded in the PDF. Default: 90.
    pub jpeg_quality: u8,

    /// LLM model identifier. If None, uses `gemini-2.5-flash`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for extraction and answering. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the analyzer may generate. Default: 8192.
    pub max_tokens: usize,

    /// Retries on a failed analyzer call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Pages read when extracting text from a PDF. Default: 20.
    pub text_page_limit: usize,

    /// Characters of extracted text sent to the analyzer. Default: 100 000.
    pub text_char_limit: usize,

    /// Extracted text shorter than this (after trimming) is treated as a
    /// scanned document and sent as page images instead. Default: 50.
    pub min_text_chars: usize,

    /// Pages rasterised for the image fallback. Default: 5.
    pub vision_page_limit: usize,

    /// Longest edge of rasterised fallback pages. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Concurrent translations per mapping level. Default: 10.
    pub translate_map_workers: usize,

    /// Concurrent translations per list level. Default: 5.
    pub translate_list_workers: usize,

    /// Leaf strings are cut to this many characters before translation.
    /// Default: 4500.
    pub translate_char_limit: usize,

    /// Per-call translation timeout in seconds. Default: 30.
    pub translate_timeout_secs: u64,

    /// Explicit Chromium/Chrome executable. If None, common names are tried.
    pub chrome_path: Option<PathBuf>,

    /// Background image tiled behind every report page.
    pub template_image: Option<PathBuf>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            tuning: ScanTuning::default(),
            render_height: 4 * A4_HEIGHT_PX,
            pdf_resolution: 100.0,
            jpeg_quality: 90,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            text_page_limit: 20,
            text_char_limit: 100_000,
            min_text_chars: 50,
            vision_page_limit: 5,
            max_rendered_pixels: 2000,
            translate_map_workers: 10,
            translate_list_workers: 5,
            translate_char_limit: 4500,
            translate_timeout_secs: 30,
            chrome_path: None,
            template_image: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("geometry", &self.geometry)
            .field("tuning", &self.tuning)
            .field("render_height", &self.render_height)
            .field("pdf_resolution", &self.pdf_resolution)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("translate_map_workers", &self.translate_map_workers)
            .field("translate_list_workers", &self.translate_list_workers)
            .field("chrome_path", &self.chrome_path)
            .field("template_image", &self.template_image)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model used when none is configured.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Model used for extraction and answering when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Builder for [`ReportConfig`].
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl fmt::Debug for ReportConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReportConfigBuilder {
    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn tuning(mut self, tuning: ScanTuning) -> Self {
        self.config.tuning = tuning;
        self
    }

    pub fn render_height(mut self, px: u32) -> Self {
        self.config.render_height = px;
        self
    }

    pub fn pdf_resolution(mut self, dpi: f32) -> Self {
        self.config.pdf_resolution = dpi;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn text_page_limit(mut self, pages: usize) -> Self {
        self.config.text_page_limit = pages.max(1);
        self
    }

    pub fn text_char_limit(mut self, chars: usize) -> Self {
        self.config.text_char_limit = chars;
        self
    }

    pub fn vision_page_limit(mut self, pages: usize) -> Self {
        self.config.vision_page_limit = pages.max(1);
        self
    }

    pub fn translate_map_workers(mut self, n: usize) -> Self {
        self.config.translate_map_workers = n.max(1);
        self
    }

    pub fn translate_list_workers(mut self, n: usize) -> Self {
        self.config.translate_list_workers = n.max(1);
        self
    }

    pub fn translate_char_limit(mut self, chars: usize) -> Self {
        self.config.translate_char_limit = chars;
        self
    }

    pub fn translate_timeout_secs(mut self, secs: u64) -> Self {
        self.config.translate_timeout_secs = secs;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn template_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template_image = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.geometry.width == 0 || c.geometry.height == 0 {
            return Err(ReportError::InvalidConfig(format!(
                "Page size must be non-zero, got {}x{}",
                c.geometry.width, c.geometry.height
            )));
        }
        if c.tuning.step == 0 || c.tuning.sample_stride == 0 {
            return Err(ReportError::InvalidConfig(
                "Scan step and sample stride must be ≥ 1".into(),
            ));
        }
        if c.tuning.min_page_height >= c.geometry.height {
            return Err(ReportError::InvalidConfig(format!(
                "Minimum page height {} must be below the page height {}",
                c.tuning.min_page_height, c.geometry.height
            )));
        }
        if c.render_height == 0 {
            return Err(ReportError::InvalidConfig(
                "Render height must be ≥ 1".into(),
            ));
        }
        if !(c.pdf_resolution > 0.0) {
            return Err(ReportError::InvalidConfig(format!(
                "PDF resolution must be positive, got {}",
                c.pdf_resolution
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a4_render() {
        let config = ReportConfig::default();
        assert_eq!(config.geometry, PageGeometry { width: 1240, height: 1754 });
        assert_eq!(config.render_height, 7016);
        assert_eq!(config.tuning.lookback, 600);
        assert_eq!(config.tuning.step, 2);
        assert_eq!(config.model_or_default(), "gemini-2.5-flash");
    }

    #[test]
    fn builder_clamps_workers() {
        let config = ReportConfig::builder()
            .translate_map_workers(0)
            .translate_list_workers(0)
            .build()
            .unwrap();
        assert_eq!(config.translate_map_workers, 1);
        assert_eq!(config.translate_list_workers, 1);
    }

    #[test]
    fn zero_page_height_rejected() {
        let err = ReportConfig::builder()
            .geometry(PageGeometry { width: 1240, height: 0 })
            .build()
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }

    #[test]
    fn min_page_height_must_fit_page() {
        let err = ReportConfig::builder()
            .geometry(PageGeometry { width: 400, height: 80 })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Minimum page height"));
    }

    #[test]
    fn debug_lists_provider_slot() {
        let text = format!("{:?}", ReportConfig::default());
        assert!(text.contains("ReportConfig"));
        assert!(text.contains("provider: None"));
    }
}
