//! Recursive translation of a field mapping.
//!
//! Every text leaf of a [`FieldMap`] is translated independently. Mapping
//! entries fan out with at most `translate_map_workers` calls in flight per
//! mapping, list items with at most `translate_list_workers` per list. A leaf
//! that fails to translate keeps its original text; siblings are unaffected
//! and the output always has exactly the input's shape and key order.
//!
//! ```text
//! Map  ──buffered(map_workers)──▶ (key, translate(value))
//! List ──buffered(list_workers)─▶ translate(item)
//! Text ──truncate(char_limit)──▶ TextTranslator::translate ─┬─ Ok  → translated
//!                                                           └─ Err → original
//! Scalar / blank text ──────────▶ unchanged
//! ```

use crate::config::ReportConfig;
use crate::error::{ReportError, TranslationError};
use crate::fields::{FieldMap, FieldValue};
use crate::pipeline::extract::truncate_chars;
use crate::progress::{or_noop, ProgressCallback};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};

/// Language used when the caller does not name one.
pub const DEFAULT_TARGET: &str = "hi";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("telugu", "te"),
    ("hindi", "hi"),
    ("tamil", "ta"),
    ("spanish", "es"),
    ("french", "fr"),
    ("german", "de"),
    ("russian", "ru"),
    ("japanese", "ja"),
    ("arabic", "ar"),
];

/// Map a language name ("Telugu") or code ("TE") to a lower-case code.
pub fn language_code(target: &str) -> String {
    let target = target.trim();
    if target.is_empty() {
        return DEFAULT_TARGET.to_string();
    }
    let lower = target.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or(lower)
}

/// Translates one string into a target language.
#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}

/// The public Google Translate endpoint used by browser extensions.
pub const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// [`TextTranslator`] backed by Google Translate over HTTP.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(timeout_secs: u64) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReportError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: GOOGLE_ENDPOINT.to_string(),
        })
    }

    /// Point at a different endpoint with the same query protocol.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TextTranslator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;
        parse_google_reply(&body)
    }
}

/// Join the translated segments of a `translate_a/single` reply.
///
/// The reply is a nested array whose first element lists sentence segments,
/// each `[translated, original, ...]`.
fn parse_google_reply(body: &str) -> Result<String, TranslationError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TranslationError::Malformed(e.to_string()))?;
    let segments = value
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| TranslationError::Malformed("missing segment list".into()))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();
    if translated.is_empty() {
        return Err(TranslationError::Malformed("no translated text".into()));
    }
    Ok(translated)
}

/// Concurrency limits and context for one translation run.
pub struct FanOut<'a> {
    translator: &'a dyn TextTranslator,
    target: String,
    map_workers: usize,
    list_workers: usize,
    char_limit: usize,
    progress: ProgressCallback,
}

impl<'a> FanOut<'a> {
    pub fn new(translator: &'a dyn TextTranslator, target: &str, config: &ReportConfig) -> Self {
        Self {
            translator,
            target: language_code(target),
            map_workers: config.translate_map_workers.max(1),
            list_workers: config.translate_list_workers.max(1),
            char_limit: config.translate_char_limit,
            progress: or_noop(config.progress_callback.as_ref()),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Translate every text leaf of `map`.
    pub async fn translate_map(&self, map: &FieldMap) -> FieldMap {
        self.map(map, String::new()).await
    }

    fn map<'b>(&'b self, map: &'b FieldMap, prefix: String) -> BoxFuture<'b, FieldMap> {
        async move {
            stream::iter(map.iter().map(|(key, value)| {
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                async move { (key.to_string(), self.value(value, path).await) }
            }))
            .buffered(self.map_workers)
            .collect::<FieldMap>()
            .await
        }
        .boxed()
    }

    fn value<'b>(&'b self, value: &'b FieldValue, path: String) -> BoxFuture<'b, FieldValue> {
        async move {
            match value {
                FieldValue::Map(inner) => FieldValue::Map(self.map(inner, path).await),
                FieldValue::List(items) => {
                    let translated = stream::iter(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| self.value(item, format!("{path}[{i}]"))),
                    )
                    .buffered(self.list_workers)
                    .collect::<Vec<_>>()
                    .await;
                    FieldValue::List(translated)
                }
                FieldValue::Text(text) if !text.trim().is_empty() => {
                    FieldValue::Text(self.leaf(text, &path).await)
                }
                other => other.clone(),
            }
        }
        .boxed()
    }

    async fn leaf(&self, text: &str, path: &str) -> String {
        let request = truncate_chars(text, self.char_limit);
        match self.translator.translate(request, &self.target).await {
            Ok(translated) => {
                debug!("Translated {} ({} chars)", path, request.len());
                translated
            }
            Err(e) => {
                warn!("{} translation failed, keeping original: {}", path, e);
                self.progress.on_translation_fallback(path, &e.to_string());
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Tagging;

    #[async_trait]
    impl TextTranslator for Tagging {
        async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
            Ok(format!("<{target}:{text}>"))
        }
    }

    #[derive(Default)]
    struct Counting {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextTranslator for Counting {
        async fn translate(&self, text: &str, _target: &str) -> Result<String, TranslationError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            Ok(text.to_uppercase())
        }
    }

    fn parse(json: &str) -> FieldMap {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn language_codes() {
        assert_eq!(language_code("Telugu"), "te");
        assert_eq!(language_code("hindi"), "hi");
        assert_eq!(language_code("FR"), "fr");
        assert_eq!(language_code("pt"), "pt");
        assert_eq!(language_code("  "), DEFAULT_TARGET);
    }

    #[test]
    fn google_reply_segments_are_joined() {
        let body = r#"[[["नमस्ते ","Hello ",null,null,1],["दुनिया","world",null,null,1]],null,"en"]"#;
        assert_eq!(parse_google_reply(body).unwrap(), "नमस्ते दुनिया");
    }

    #[test]
    fn google_reply_malformed() {
        assert!(matches!(
            parse_google_reply("<html>"),
            Err(TranslationError::Malformed(_))
        ));
        assert!(matches!(
            parse_google_reply("[null]"),
            Err(TranslationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn shape_and_order_preserved() {
        let input = parse(
            r#"{"z":"one","a":{"y":"two","x":["three",""]},"n":5,"blank":"  ","none":null}"#,
        );
        let config = ReportConfig::default();
        let out = FanOut::new(&Tagging, "Tamil", &config)
            .translate_map(&input)
            .await;
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"z":"<ta:one>","a":{"y":"<ta:two>","x":["<ta:three>",""]},"n":5,"blank":"  ","none":null}"#
        );
    }

    #[tokio::test]
    async fn long_leaves_are_truncated_before_sending() {
        let translator = Counting::default();
        let mut input = FieldMap::new();
        input.insert("long", "é".repeat(5000));
        let config = ReportConfig::builder().translate_char_limit(4500).build().unwrap();
        FanOut::new(&translator, "hi", &config)
            .translate_map(&input)
            .await;
        let seen = translator.seen.lock().unwrap();
        assert_eq!(seen[0].chars().count(), 4500);
    }

    #[tokio::test]
    async fn map_fan_out_is_bounded() {
        let translator = Counting::default();
        let input: FieldMap = (0..25)
            .map(|i| (format!("k{i}"), FieldValue::from(format!("v{i}"))))
            .collect();
        let config = ReportConfig::default();
        let out = FanOut::new(&translator, "hi", &config)
            .translate_map(&input)
            .await;

        let peak = translator.peak.load(Ordering::SeqCst);
        assert!(peak > 1, "expected concurrent calls, peak {peak}");
        assert!(peak <= 10, "map fan-out exceeded 10: {peak}");
        assert_eq!(out.len(), 25);
        assert_eq!(out.get("k7").unwrap().as_text(), Some("V7"));
    }

    #[tokio::test]
    async fn list_fan_out_is_bounded() {
        let translator = Counting::default();
        let items: Vec<FieldValue> = (0..12).map(|i| FieldValue::from(format!("d{i}"))).collect();
        let mut input = FieldMap::new();
        input.insert("Required_Documents", FieldValue::List(items));
        let config = ReportConfig::default();
        let out = FanOut::new(&translator, "hi", &config)
            .translate_map(&input)
            .await;

        assert!(translator.peak.load(Ordering::SeqCst) <= 5);
        assert_eq!(
            out.get("Required_Documents").unwrap().display_text(),
            (0..12).map(|i| format!("D{i}")).collect::<Vec<_>>().join(", ")
        );
    }
}
