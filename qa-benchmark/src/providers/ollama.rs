//! Ollama chat client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};
use crate::runner::rate_limiter::RateLimiter;

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3";

/// Base URL from `OLLAMA_HOST`, falling back to the local default
pub(crate) fn base_url_from_env() -> String {
    match std::env::var("OLLAMA_HOST") {
        Ok(host) if host.starts_with("http://") || host.starts_with("https://") => {
            host.trim_end_matches('/').to_string()
        }
        Ok(host) if !host.is_empty() => format!("http://{}", host.trim_end_matches('/')),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

/// Client for Ollama's `/api/chat`
pub struct OllamaClient {
    base_url: String,
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    default_model: String,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            base_url: base_url_from_env(),
            http_client: Client::new(),
            rate_limiter: Arc::new(RateLimiter::unlimited()),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set requests per minute; 0 disables limiting
    pub fn with_rate_limit(mut self, rpm: u32) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(rpm));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    message: ChatMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
pub(crate) struct OllamaError {
    pub(crate) error: String,
}

/// Map a non-success response to a provider error
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    // Ollama answers 404 when the model has not been pulled
    if status == 404 {
        return ProviderError::Config(format!("Model not available: {}", message));
    }
    ProviderError::Api { status, message }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages: request.all_messages(),
            stream: false,
            options: ChatOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        let text = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Parse(format!("Invalid chat response: {}", e)))?;

        Ok(CompletionResponse {
            content: chat.message.content,
            model: chat.model,
            input_tokens: chat.prompt_eval_count,
            output_tokens: chat.eval_count,
            finish_reason: chat.done_reason.unwrap_or_else(|| "stop".to_string()),
            latency_ms,
        })
    }

    fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    async fn health_check(&self) -> ProviderResult<bool> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::serve;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_chat_round_trip() {
        let app = Router::new()
            .route(
                "/api/chat",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["stream"], false);
                    assert_eq!(body["options"]["num_predict"], 64);
                    assert_eq!(body["messages"][0]["role"], "system");
                    assert_eq!(body["messages"][1]["content"], "Who wrote Hamlet?");
                    Json(json!({
                        "model": "llama3",
                        "message": {"role": "assistant", "content": "William Shakespeare."},
                        "done": true,
                        "done_reason": "stop",
                        "prompt_eval_count": 20,
                        "eval_count": 4
                    }))
                }),
            )
            .route("/api/tags", get(|| async { Json(json!({"models": []})) }));
        let base = serve(app).await;

        let client = OllamaClient::new().with_base_url(base);
        let request = CompletionRequest::new(vec![Message::user("Who wrote Hamlet?")], 64)
            .with_system("Answer briefly.");
        let response = client.complete(&request).await.unwrap();

        assert_eq!(response.content, "William Shakespeare.");
        assert_eq!(response.output_tokens, 4);
        assert!(client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_model_is_a_config_error() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "model \"nope\" not found, try pulling it first"})),
                )
            }),
        );
        let base = serve(app).await;

        let client = OllamaClient::new().with_base_url(base).with_model("nope");
        let request = CompletionRequest::new(vec![Message::user("hi")], 8);
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Config(ref m) if m.contains("not found")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "loading model") }),
        );
        let base = serve(app).await;

        let client = OllamaClient::new().with_base_url(base);
        let request = CompletionRequest::new(vec![Message::user("hi")], 8);
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
        assert!(err.is_retryable());
    }
}
