//! Resume review: extracts text from an uploaded PDF and asks the model for
//! constructive feedback.

use anyhow::anyhow;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::generation::pipeline::{run_completion, GeneratedContent};
use crate::generation::prompts::RESUME_REVIEW_PROMPT_TEMPLATE;
use crate::generation::sanitize::SanitizationMode;
use crate::llm_client::{CompletionProvider, CompletionRequest};

/// Largest resume accepted for review.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
/// Request body ceiling for the upload route. Above the resume limit so
/// oversized files reach the size check and get a readable message.
pub const RESUME_UPLOAD_LIMIT: usize = 2 * MAX_RESUME_BYTES;

pub const RESUME_TOO_LARGE_MESSAGE: &str = "Resume file size exceeds allowed size (5MB).";

const REVIEW_TEMPERATURE: f32 = 0.7;
const REVIEW_MAX_TOKENS: u32 = 1000;

/// Checks the upload size and pulls plain text out of the PDF.
pub fn extract_resume_text(pdf: &[u8]) -> Result<String, AppError> {
    check_resume_size(pdf)?;

    let text = pdf_extract::extract_text_from_mem(pdf)
        .map_err(|e| AppError::Validation(format!("Could not read resume PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume PDF contains no extractable text".to_string(),
        ));
    }

    Ok(text)
}

fn check_resume_size(pdf: &[u8]) -> Result<(), AppError> {
    if pdf.len() > MAX_RESUME_BYTES {
        return Err(AppError::PayloadTooLarge(RESUME_TOO_LARGE_MESSAGE.to_string()));
    }
    if pdf.is_empty() {
        return Err(AppError::Validation("Resume file is empty".to_string()));
    }
    Ok(())
}

/// Runs CPU-bound work on the blocking pool. A panic in `task` surfaces as
/// `AppError::Internal` instead of dropping the connection.
async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| {
            AppError::Internal(anyhow!("spawn_blocking failed in resume extraction: {e}"))
        })?
}

pub fn build_review_prompt(resume_text: &str) -> String {
    RESUME_REVIEW_PROMPT_TEMPLATE.replace("{resume_text}", resume_text.trim())
}

/// Reviews a resume PDF with the given model.
pub async fn review_resume(
    provider: &dyn CompletionProvider,
    model: &str,
    pdf: Bytes,
) -> Result<GeneratedContent, AppError> {
    // Reject oversized uploads before handing them to the blocking pool.
    check_resume_size(&pdf)?;
    let pdf_len = pdf.len();

    // PDF parsing is CPU-bound; keep it off the async executor.
    let resume_text = run_blocking(move || extract_resume_text(&pdf)).await?;
    info!(
        "Extracted {} chars from {} byte resume",
        resume_text.chars().count(),
        pdf_len
    );

    let request = CompletionRequest::user_prompt(
        model,
        build_review_prompt(&resume_text),
        REVIEW_TEMPERATURE,
        REVIEW_MAX_TOKENS,
    )?;

    run_completion(provider, &request, SanitizationMode::General).await
}
