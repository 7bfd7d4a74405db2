use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion provider. `LlmClient` in production; swapped for a fake in tests.
    pub llm: Arc<dyn CompletionProvider>,
    pub config: Config,
}
