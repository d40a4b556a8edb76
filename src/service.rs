//! Entry points: analyze, translate, generate-pdf, ask, health.
//!
//! Each function is one request of the bid-report service. They return
//! `Err(ReportError)` only for failures that leave nothing useful to return;
//! per-leaf translation failures are absorbed by [`translate_fields`].

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::fields::{parse_analysis, FieldMap};
use crate::paginate;
use crate::pipeline::extract::{self, has_usable_text, truncate_chars};
use crate::pipeline::html::ReportHtml;
use crate::pipeline::input::{self, DocumentKind, ResolvedInput};
use crate::pipeline::raster::{self, HtmlRasterizer};
use crate::pipeline::translate::{FanOut, GoogleTranslator, TextTranslator};
use crate::pipeline::{encode, llm};
use crate::progress::or_noop;
use crate::prompts::{ask_prompt, EXTRACTION_PROMPT, VISION_PREAMBLE};
use edgequake_llm::{ChatMessage, LLMProvider, ProviderFactory};
use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How the document reached the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Extracted text, after truncation.
    Text { chars: usize },
    /// Rasterised pages sent as images.
    Vision { pages: usize },
}

/// Result of [`analyze_document`].
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub fields: FieldMap,
    pub source: AnalysisSource,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Liveness payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

/// Always `{"status":"ok","service":"bid-report"}`.
pub fn health() -> Health {
    Health {
        status: "ok",
        service: "bid-report",
    }
}

// ── Analyze ──────────────────────────────────────────────────────────────

/// Extract tender fields from a PDF or text file, given as a path or URL.
///
/// PDFs with a usable text layer are analysed from their text (first
/// `text_page_limit` pages, cut to `text_char_limit` characters). Scanned
/// PDFs fall back to sending the first `vision_page_limit` pages as images.
pub async fn analyze_document(
    input_str: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<Analysis, ReportError> {
    let input_str = input_str.as_ref();
    info!("Analyzing: {}", input_str);
    let provider = resolve_provider(config).await?;
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    analyze_resolved(&provider, &resolved, config).await
}

/// Like [`analyze_document`], for an uploaded document held in memory.
///
/// The bytes are staged in a temp file that is removed before returning.
pub async fn analyze_bytes(
    bytes: &[u8],
    filename: &str,
    config: &ReportConfig,
) -> Result<Analysis, ReportError> {
    info!("Analyzing upload: {} ({} bytes)", filename, bytes.len());
    let provider = resolve_provider(config).await?;
    let resolved = input::resolve_bytes(bytes, filename).await?;
    analyze_resolved(&provider, &resolved, config).await
}

async fn analyze_resolved(
    provider: &Arc<dyn LLMProvider>,
    resolved: &ResolvedInput,
    config: &ReportConfig,
) -> Result<Analysis, ReportError> {
    let start = Instant::now();
    let path = resolved.path();

    let text = match resolved.kind() {
        DocumentKind::Text => input::read_text(path).await?,
        DocumentKind::Pdf => extract::extract_text(path, config.text_page_limit).await?,
    };

    let (user_message, source) = if has_usable_text(&text, config.min_text_chars)
        || (resolved.kind() == DocumentKind::Text && !text.trim().is_empty())
    {
        let body = truncate_chars(&text, config.text_char_limit);
        info!("Analyzing extracted text ({} chars)", body.chars().count());
        (
            ChatMessage::user(body),
            AnalysisSource::Text {
                chars: body.chars().count(),
            },
        )
    } else if resolved.kind() == DocumentKind::Pdf {
        info!(
            "Text layer too short ({} chars), sending first {} page(s) as images",
            text.trim().chars().count(),
            config.vision_page_limit
        );
        let pages =
            extract::render_pages(path, config.vision_page_limit, config.max_rendered_pixels)
                .await?;
        let images = encode::encode_scans(&pages)?;
        let count = images.len();
        (
            ChatMessage::user_with_images(VISION_PREAMBLE, images),
            AnalysisSource::Vision { pages: count },
        )
    } else {
        return Err(ReportError::MissingInput(format!(
            "'{}' contains no text",
            path.display()
        )));
    };

    let messages = vec![ChatMessage::system(EXTRACTION_PROMPT), user_message];
    let reply = llm::complete_with_retry(provider, &messages, config, "analysis").await?;
    let fields = parse_analysis(&reply.content)?;

    info!(
        "Analysis complete: {} field(s), {}ms",
        fields.len(),
        start.elapsed().as_millis()
    );

    Ok(Analysis {
        fields,
        source,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

// ── Translate ────────────────────────────────────────────────────────────

/// Translate every text leaf of `data` into `target` (name or code).
///
/// Never fails: a leaf that cannot be translated keeps its original text.
pub async fn translate_fields(
    data: &FieldMap,
    target: &str,
    translator: &dyn TextTranslator,
    config: &ReportConfig,
) -> FieldMap {
    let fan_out = FanOut::new(translator, target, config);
    info!(
        "Translating {} field(s) to '{}'",
        data.len(),
        fan_out.target()
    );
    fan_out.translate_map(data).await
}

/// [`translate_fields`] with the default [`GoogleTranslator`].
pub async fn translate_fields_google(
    data: &FieldMap,
    target: &str,
    config: &ReportConfig,
) -> Result<FieldMap, ReportError> {
    let translator = GoogleTranslator::new(config.translate_timeout_secs)?;
    Ok(translate_fields(data, target, &translator, config).await)
}

// ── Generate PDF ─────────────────────────────────────────────────────────

/// Render `data` as a report and paginate it into PDF bytes.
///
/// # Errors
/// - [`ReportError::MissingInput`] when `data` is empty
/// - [`ReportError::Render`] when rasterisation produced no image
/// - [`ReportError::PaginationEmpty`] when the render was entirely blank
pub async fn generate_pdf(
    data: &FieldMap,
    rasterizer: &dyn HtmlRasterizer,
    config: &ReportConfig,
) -> Result<Vec<u8>, ReportError> {
    if data.is_empty() {
        return Err(ReportError::MissingInput(
            "no data provided for report generation".into(),
        ));
    }

    let background = load_template(config).await;
    let html = ReportHtml::new(data, config.geometry)
        .background(background.as_deref())
        .render();
    debug!("Report HTML: {} bytes", html.len());

    let bitmap = rasterizer
        .rasterize(&html, config.geometry.width, config.render_height)
        .await?;
    or_noop(config.progress_callback.as_ref()).on_render_complete(bitmap.width(), bitmap.height());

    paginate_bitmap(bitmap, config).await
}

/// [`generate_pdf`] with headless Chromium ([`raster::ChromeRasterizer`]).
pub async fn generate_pdf_chrome(
    data: &FieldMap,
    config: &ReportConfig,
) -> Result<Vec<u8>, ReportError> {
    let rasterizer = raster::ChromeRasterizer::new(config.chrome_path.clone());
    generate_pdf(data, &rasterizer, config).await
}

/// Generate the report and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated PDF behind. Returns the number of bytes written.
pub async fn generate_pdf_to_file(
    data: &FieldMap,
    rasterizer: &dyn HtmlRasterizer,
    output_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<usize, ReportError> {
    let bytes = generate_pdf(data, rasterizer, config).await?;
    write_atomic(output_path.as_ref(), &bytes).await?;
    Ok(bytes.len())
}

/// Paginate an existing tall PNG (or any decodable image) into PDF bytes.
pub async fn paginate_image(
    image_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<Vec<u8>, ReportError> {
    let path = image_path.as_ref().to_path_buf();
    let bitmap = tokio::task::spawn_blocking(move || raster::load_screenshot(&path))
        .await
        .map_err(|e| ReportError::Internal(format!("Decode task panicked: {}", e)))??;
    paginate_bitmap(bitmap, config).await
}

async fn paginate_bitmap(bitmap: RgbImage, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || paginate::paginate_rgb(&bitmap, &config))
        .await
        .map_err(|e| ReportError::Internal(format!("Pagination task panicked: {}", e)))?
}

async fn load_template(config: &ReportConfig) -> Option<Vec<u8>> {
    let path = config.template_image.as_ref()?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(
                "Template image '{}' unreadable ({}), using white background",
                path.display(),
                e
            );
            None
        }
    }
}

/// Write `bytes` next to `path` and rename into place.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let fail = |source| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}

// ── Ask ──────────────────────────────────────────────────────────────────

/// Answer a question about an analysed tender, using only `context`.
pub async fn ask_question(
    question: &str,
    context: &FieldMap,
    config: &ReportConfig,
) -> Result<String, ReportError> {
    let question = question.trim();
    if question.is_empty() || context.is_empty() {
        return Err(ReportError::MissingInput("missing question or context".into()));
    }

    let context_json = serde_json::to_string_pretty(context)
        .map_err(|e| ReportError::Serialize(format!("context: {e}")))?;
    let provider = resolve_provider(config).await?;
    let messages = vec![ChatMessage::user(ask_prompt(&context_json, question))];
    let reply = llm::complete_with_retry(&provider, &messages, config, "ask").await?;
    Ok(reply.content.trim().to_string())
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or the
///    default model; the factory reads that provider's API key variable.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini** when `GEMINI_API_KEY` is set.
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`].
pub async fn resolve_provider(config: &ReportConfig) -> Result<Arc<dyn LLMProvider>, ReportError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.trim().is_empty()) {
        return create_provider("gemini", config.model_or_default());
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or OPENAI_API_KEY, ANTHROPIC_API_KEY) or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_payload() {
        let json = serde_json::to_string(&health()).unwrap();
        assert_eq!(json, r#"{"status":"ok","service":"bid-report"}"#);
    }

    #[test]
    fn analysis_source_serialises_with_mode() {
        let json = serde_json::to_string(&AnalysisSource::Vision { pages: 3 }).unwrap();
        assert_eq!(json, r#"{"mode":"vision","pages":3}"#);
    }

    #[tokio::test]
    async fn ask_requires_question_and_context() {
        let mut context = FieldMap::new();
        context.insert("EMD_Amount", "Rs 1 lakh");
        let config = ReportConfig::default();

        let err = ask_question("   ", &context, &config).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingInput(_)));

        let err = ask_question("What is the EMD?", &FieldMap::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingInput(_)));
    }

    #[tokio::test]
    async fn generate_requires_data() {
        let err = generate_pdf_chrome(&FieldMap::new(), &ReportConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingInput(_)));
    }

    #[tokio::test]
    async fn atomic_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/report.pdf");
        write_atomic(&path, b"%PDF-1.5").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
        assert!(!dir.path().join("out/nested/report.pdf.tmp").exists());
    }
}
