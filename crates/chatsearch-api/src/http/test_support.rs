//! Router fixtures for handler tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use chatsearch_core::chat::generator::LlmAnswerGenerator;
use chatsearch_core::chat::memory::InMemoryChatRepository;
use chatsearch_core::llm::box_provider::BoxLlmProvider;
use chatsearch_core::llm::provider::LlmProvider;
use chatsearch_infra::store::ChatStore;
use chatsearch_types::config::LlmConfig;
use chatsearch_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use crate::http::router::build_router;
use crate::state::AppState;

/// Provider that answers every request with the same text, or always fails.
pub struct FixedProvider {
    answer: Option<String>,
}

impl LlmProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn default_model(&self) -> &str {
        "fixed-model"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match &self.answer {
            Some(answer) => Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: answer.clone(),
                model: "fixed-model".to_string(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            None => Err(LlmError::Provider {
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

/// State over a fresh in-memory store; `answer: None` makes generation fail.
pub fn app_state(answer: Option<&str>, serialize_turns: bool) -> AppState {
    let provider = FixedProvider {
        answer: answer.map(str::to_string),
    };
    let generator = LlmAnswerGenerator::new(BoxLlmProvider::new(provider), &LlmConfig::default());
    AppState::from_parts(
        ChatStore::Memory(InMemoryChatRepository::new()),
        generator,
        serialize_turns,
    )
}

/// Router whose generator always answers `answer`.
pub fn router_answering(answer: &str) -> Router {
    build_router(app_state(Some(answer), true))
}

/// Router whose generator always fails.
pub fn failing_router() -> Router {
    build_router(app_state(None, true))
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Send a raw (possibly malformed) JSON body.
pub async fn send_raw(router: &Router, method: &str, uri: &str, raw: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}
