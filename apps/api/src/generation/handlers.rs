//! Axum route handlers for the AI generation API.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::generation::optimizer::{optimize_prompt_value, OptimizationBounds};
use crate::generation::pipeline::{run_completion, GeneratedContent};
use crate::generation::review::{review_resume, RESUME_TOO_LARGE_MESSAGE};
use crate::generation::sanitize::SanitizationMode;
use crate::llm_client::CompletionRequest;
use crate::state::AppState;

const GENERATION_TEMPERATURE: f32 = 0.7;
/// Headroom for a long instruction prompt plus the full title.
const BLOG_TITLE_MAX_TOKENS: u32 = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    #[serde(default)]
    pub prompt: String,
    /// Token budget for the article.
    pub length: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBlogTitleRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct OptimizePromptRequest {
    #[serde(default)]
    pub prompt: Value,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl From<GeneratedContent> for GenerationResponse {
    fn from(generated: GeneratedContent) -> Self {
        Self {
            success: true,
            content: generated.content,
            truncated: generated.truncated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptimizePromptResponse {
    pub success: bool,
    #[serde(rename = "optimizedPrompt")]
    pub optimized_prompt: String,
}

fn require_prompt(prompt: &str) -> Result<(), AppError> {
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("Prompt is required".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-article
///
/// Generates long-form content. `length` is the token budget; paragraph
/// structure in the response is preserved.
pub async fn handle_generate_article(
    State(state): State<AppState>,
    payload: Result<Json<GenerateArticleRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let Json(request) = payload?;
    require_prompt(&request.prompt)?;

    let completion = CompletionRequest::user_prompt(
        state.config.llm_model.as_str(),
        request.prompt,
        GENERATION_TEMPERATURE,
        request.length,
    )?;

    let generated =
        run_completion(state.llm.as_ref(), &completion, SanitizationMode::Article).await?;

    Ok(Json(generated.into()))
}

/// POST /api/ai/generate-blog-title
///
/// Returns a single cleaned title line.
pub async fn handle_generate_blog_title(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBlogTitleRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let Json(request) = payload?;
    require_prompt(&request.prompt)?;

    let completion = CompletionRequest::user_prompt(
        state.config.llm_model.as_str(),
        request.prompt,
        GENERATION_TEMPERATURE,
        BLOG_TITLE_MAX_TOKENS,
    )?;

    let generated =
        run_completion(state.llm.as_ref(), &completion, SanitizationMode::Title).await?;

    Ok(Json(generated.into()))
}

/// POST /api/ai/optimize-prompt
pub async fn handle_optimize_prompt(
    State(state): State<AppState>,
    payload: Result<Json<OptimizePromptRequest>, JsonRejection>,
) -> Result<Json<OptimizePromptResponse>, AppError> {
    let Json(request) = payload?;

    let missing = match &request.prompt {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if missing {
        return Err(AppError::Validation("Prompt is required".to_string()));
    }

    let optimized_prompt = optimize_prompt_value(
        state.llm.as_ref(),
        &request.prompt,
        &OptimizationBounds::default(),
    )
    .await?;

    Ok(Json(OptimizePromptResponse {
        success: true,
        optimized_prompt,
    }))
}

/// POST /api/ai/resume-review
///
/// Multipart upload with a `resume` PDF field.
pub async fn handle_resume_review(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerationResponse>, AppError> {
    let mut resume: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some("resume") {
            resume = Some(field.bytes().await.map_err(upload_error)?);
        }
    }

    let resume =
        resume.ok_or_else(|| AppError::Validation("Resume file is required".to_string()))?;

    let generated =
        review_resume(state.llm.as_ref(), &state.config.review_model, resume).await?;

    Ok(Json(generated.into()))
}

/// Uploads past the route's body limit fail mid-stream; report them with the
/// same message as the resume size check.
fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(RESUME_TOO_LARGE_MESSAGE.to_string())
    } else {
        e.into()
    }
}
