pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::generation::review::RESUME_UPLOAD_LIMIT;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api/ai", ai_routes())
        .with_state(state)
}

fn ai_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/generate-article",
            post(handlers::handle_generate_article),
        )
        .route(
            "/generate-blog-title",
            post(handlers::handle_generate_blog_title),
        )
        .route("/optimize-prompt", post(handlers::handle_optimize_prompt))
        .route(
            "/resume-review",
            post(handlers::handle_resume_review).layer(DefaultBodyLimit::max(RESUME_UPLOAD_LIMIT)),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::fake::FakeProvider;
    use crate::llm_client::{FinishReason, LlmError};

    fn test_app(provider: Arc<FakeProvider>) -> Router {
        let state = AppState {
            llm: provider,
            config: Config {
                gemini_api_key: "test-key".to_string(),
                llm_base_url: "http://localhost:9".to_string(),
                llm_model: "test-model".to_string(),
                review_model: "review-model".to_string(),
                llm_timeout_secs: 5,
                port: 0,
                rust_log: "debug".to_string(),
            },
        };
        build_router(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(Arc::new(FakeProvider::replying("", FinishReason::Stop)));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_blog_title_is_sanitized() {
        let provider = Arc::new(FakeProvider::replying(
            "1. \"Ownership Without Tears\"\nWhy it works: ...",
            FinishReason::Stop,
        ));
        let app = test_app(provider.clone());

        let (status, body) = send(
            app,
            post_json(
                "/api/ai/generate-blog-title",
                json!({"prompt": "Generate ONLY a blog title for the keyword \"rust\""}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "content": "Ownership Without Tears"}));

        let requests = provider.recorded();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model(), "test-model");
        assert_eq!(requests[0].max_tokens(), 500);
    }

    #[tokio::test]
    async fn test_article_uses_length_and_flags_truncation() {
        let provider = Arc::new(FakeProvider::replying(
            "Article:\nIntro paragraph.\n\nSecond paragr",
            FinishReason::Length,
        ));
        let app = test_app(provider.clone());

        let (status, body) = send(
            app,
            post_json(
                "/api/ai/generate-article",
                json!({"prompt": "Write an article about Rust in Short (500-800 words)", "length": 800}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "Intro paragraph.\n\nSecond paragr");
        assert_eq!(body["truncated"], true);
        assert_eq!(provider.recorded()[0].max_tokens(), 800);
    }

    #[tokio::test]
    async fn test_article_zero_length_is_bad_request() {
        let provider = Arc::new(FakeProvider::replying("unused", FinishReason::Stop));
        let app = test_app(provider.clone());

        let (status, body) = send(
            app,
            post_json("/api/ai/generate-article", json!({"prompt": "Write about Rust", "length": 0})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_uses_envelope() {
        let app = test_app(Arc::new(FakeProvider::replying("", FinishReason::Stop)));
        let request = Request::builder()
            .method("POST")
            .uri("/api/ai/generate-blog-title")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_optimize_prompt_required() {
        let app = test_app(Arc::new(FakeProvider::replying("", FinishReason::Stop)));
        let (status, body) = send(app, post_json("/api/ai/optimize-prompt", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Prompt is required");
    }

    #[tokio::test]
    async fn test_optimize_prompt_too_short() {
        let app = test_app(Arc::new(FakeProvider::replying("", FinishReason::Stop)));
        let (status, body) =
            send(app, post_json("/api/ai/optimize-prompt", json!({"prompt": "short"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("too short"));
    }

    #[tokio::test]
    async fn test_optimize_prompt_success() {
        let app = test_app(Arc::new(FakeProvider::replying(
            "'Write a friendly, informative blog post about caring for cats'",
            FinishReason::Stop,
        )));
        let (status, body) = send(
            app,
            post_json("/api/ai/optimize-prompt", json!({"prompt": "Write about cats"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "optimizedPrompt": "Write a friendly, informative blog post about caring for cats"
            })
        );
    }

    #[tokio::test]
    async fn test_optimize_prompt_degenerate_result() {
        let app = test_app(Arc::new(FakeProvider::replying("Cats", FinishReason::Stop)));
        let (status, body) = send(
            app,
            post_json("/api/ai/optimize-prompt", json!({"prompt": "Write about cats"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Optimization produced invalid result");
    }

    #[tokio::test]
    async fn test_optimize_prompt_quota_exceeded() {
        let app = test_app(Arc::new(FakeProvider::failing(|| LlmError::QuotaExceeded {
            message: "You exceeded your current quota".to_string(),
        })));
        let (status, body) = send(
            app,
            post_json("/api/ai/optimize-prompt", json!({"prompt": "Write about cats"})),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["message"].as_str().unwrap().contains("quota"));
    }

    fn resume_upload(size: usize) -> Request<Body> {
        let mut body = b"--X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"resume\"; filename=\"resume.pdf\"\r\n\
            Content-Type: application/pdf\r\n\r\n"
            .to_vec();
        body.extend(std::iter::repeat(b'a').take(size));
        body.extend_from_slice(b"\r\n--X-BOUNDARY--\r\n");

        Request::builder()
            .method("POST")
            .uri("/api/ai/resume-review")
            .header("content-type", "multipart/form-data; boundary=X-BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resume_over_size_limit_is_payload_too_large() {
        let provider = Arc::new(FakeProvider::replying("unused", FinishReason::Stop));
        let app = test_app(provider.clone());

        let (status, body) = send(app, resume_upload(6 * 1024 * 1024)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["message"], "Resume file size exceeds allowed size (5MB).");
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_resume_over_body_limit_is_payload_too_large() {
        let provider = Arc::new(FakeProvider::replying("unused", FinishReason::Stop));
        let app = test_app(provider.clone());

        let (status, body) = send(app, resume_upload(11 * 1024 * 1024)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Resume file size exceeds allowed size (5MB).");
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_resume_review_requires_file() {
        let provider = Arc::new(FakeProvider::replying("unused", FinishReason::Stop));
        let app = test_app(provider.clone());
        let multipart_body = "--X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"note\"\r\n\r\n\
            hello\r\n\
            --X-BOUNDARY--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/api/ai/resume-review")
            .header("content-type", "multipart/form-data; boundary=X-BOUNDARY")
            .body(Body::from(multipart_body))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Resume file is required");
        assert!(provider.recorded().is_empty());
    }
}
