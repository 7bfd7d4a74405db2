//! Scripted `CompletionProvider` for tests. Records every request it receives.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest, CompletionResult, FinishReason, LlmError};

type Responder = Box<dyn Fn() -> Result<CompletionResult, LlmError> + Send + Sync>;

pub struct FakeProvider {
    respond: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeProvider {
    pub fn replying(text: &str, finish_reason: FinishReason) -> Self {
        let text = text.to_string();
        Self {
            respond: Box::new(move || {
                Ok(CompletionResult {
                    text: text.clone(),
                    finish_reason: finish_reason.clone(),
                })
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(move || Err(error())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn fetch_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)()
    }
}
