//! Prompt Optimizer: asks the model to rewrite a user's prompt for clarity.
//!
//! Phases, terminal on first failure:
//! 1. Validate: input is a string, trimmed length within `OptimizationBounds`.
//! 2. Optimize: one completion with a fixed system instruction, model,
//!    temperature and token budget.
//! 3. Post-check: drop wrapping quotes; reject empty output or output shorter
//!    than half the input, which indicates a degenerate response.

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::pipeline::run_completion;
use crate::generation::prompts::OPTIMIZE_SYSTEM;
use crate::generation::sanitize::{strip_quote_pair, SanitizationMode};
use crate::llm_client::{ChatMessage, CompletionProvider, CompletionRequest};

/// The model used for prompt optimization. Fixed, independent of the
/// content-generation model.
pub const OPTIMIZER_MODEL: &str = "gemini-3-flash-preview";
const OPTIMIZER_TEMPERATURE: f32 = 0.5;
const OPTIMIZER_MAX_TOKENS: u32 = 200;

/// Input length limits, counted in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationBounds {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for OptimizationBounds {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 2000,
        }
    }
}

/// Checks the raw prompt and returns its trimmed form.
pub fn validate_prompt<'a>(
    raw: &'a str,
    bounds: &OptimizationBounds,
) -> Result<&'a str, AppError> {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();

    if length < bounds.min_length {
        return Err(AppError::Validation(format!(
            "Prompt too short - minimum {} characters required",
            bounds.min_length
        )));
    }

    if length > bounds.max_length {
        return Err(AppError::Validation(format!(
            "Prompt exceeds maximum length of {} characters",
            bounds.max_length
        )));
    }

    Ok(trimmed)
}

/// Optimizes a prompt that arrived as untyped JSON.
pub async fn optimize_prompt_value(
    provider: &dyn CompletionProvider,
    raw: &Value,
    bounds: &OptimizationBounds,
) -> Result<String, AppError> {
    let Some(text) = raw.as_str() else {
        return Err(AppError::Validation(
            "Invalid prompt type - must be a string".to_string(),
        ));
    };
    optimize_prompt(provider, text, bounds).await
}

/// Runs the three optimization phases and returns the improved prompt.
pub async fn optimize_prompt(
    provider: &dyn CompletionProvider,
    raw: &str,
    bounds: &OptimizationBounds,
) -> Result<String, AppError> {
    let prompt = validate_prompt(raw, bounds)?;

    let request = CompletionRequest::new(
        OPTIMIZER_MODEL,
        vec![ChatMessage::system(OPTIMIZE_SYSTEM), ChatMessage::user(prompt)],
        OPTIMIZER_TEMPERATURE,
        OPTIMIZER_MAX_TOKENS,
    )?;

    let generated = run_completion(provider, &request, SanitizationMode::General).await?;

    let cleaned = strip_quote_pair(&generated.content).trim();
    let input_length = prompt.chars().count();
    let output_length = cleaned.chars().count();

    if cleaned.is_empty() || output_length * 2 < input_length {
        warn!(
            "Optimization result rejected: {} chars for a {} char prompt",
            output_length, input_length
        );
        return Err(AppError::InvalidOptimizationResult);
    }

    info!(
        "Prompt optimized: {} -> {} chars",
        input_length, output_length
    );

    Ok(cleaned.to_string())
}
