//! Completion pipeline: fetch, extract, validate, sanitize.
//!
//! Stateless and request-scoped. The only suspension point is the provider
//! call; everything after it is pure string work.

use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;
use crate::generation::sanitize::{sanitize, SanitizationMode};
use crate::llm_client::{validate_completion, CompletionProvider, CompletionRequest};

/// Final, sanitized content handed back to the HTTP layer.
///
/// `truncated` is set when the provider stopped at the token budget. The
/// text is still returned; the caller decides whether to offer a retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedContent {
    pub content: String,
    pub truncated: bool,
}

/// Runs one completion and normalizes its text with the rules for `mode`.
pub async fn run_completion(
    provider: &dyn CompletionProvider,
    request: &CompletionRequest,
    mode: SanitizationMode,
) -> Result<GeneratedContent, AppError> {
    let result = provider.fetch_completion(request).await?;

    debug!(
        "LLM response ({:?}): finish_reason={:?}, raw={:?}",
        mode, result.finish_reason, result.text
    );

    let status = validate_completion(&result);
    let content = sanitize(&result.text, mode);

    debug!("LLM response ({:?}): cleaned={:?}", mode, content);

    Ok(GeneratedContent {
        content,
        truncated: !status.is_complete(),
    })
}
