//! Analyzer calls: send chat messages to the provider with timeout and retry.
//!
//! Both field extraction and question answering go through
//! [`complete_with_retry`]. Prompt text lives in [`crate::prompts`].
//!
//! ## Retry Strategy
//!
//! Rate limits (429) and overloads (503) are common on shared LLM keys.
//! Each attempt is bounded by `api_timeout_secs`; failed attempts back off
//! exponentially (`retry_backoff_ms * 2^(attempt-1)`), so the defaults wait
//! 500 ms and then 1 s before giving up.

use crate::config::ReportConfig;
use crate::error::ReportError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// A successful completion with its token accounting.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Call the provider, retrying failures and timeouts.
///
/// `service` names the call in logs and in the returned
/// [`ReportError::UpstreamService`] ("analysis", "ask").
pub async fn complete_with_retry(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    config: &ReportConfig,
    service: &str,
) -> Result<LlmReply, ReportError> {
    let start = Instant::now();
    let options = build_options(config);
    let per_call = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = String::from("no attempt made");

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                service, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(per_call, provider.chat(messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    service, response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(LlmReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    attempts: attempt + 1,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                last_err = e.to_string();
                warn!("{}: attempt {} failed: {}", service, attempt + 1, last_err);
            }
            Err(_) => {
                last_err = format!("timed out after {}s", config.api_timeout_secs);
                warn!("{}: attempt {} {}", service, attempt + 1, last_err);
            }
        }
    }

    Err(ReportError::UpstreamService {
        service: service.to_string(),
        attempts: config.max_retries + 1,
        detail: last_err,
    })
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(config: &ReportConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
