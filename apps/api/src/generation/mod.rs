// AI content generation: completion pipeline, response sanitization,
// prompt optimization and resume review.
// All provider calls go through llm_client::CompletionProvider.

pub mod handlers;
pub mod optimizer;
pub mod pipeline;
pub mod prompts;
pub mod review;
pub mod sanitize;
