//! Sentence-embedding clients

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use verdict::{Embedder, EvalError, EvalResult};

use crate::config::{EmbeddingConfig, ProviderKind};

/// Embeddings from Ollama's `/api/embed`
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    http_client: Client,
}

impl OllamaEmbedder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: crate::providers::ollama::base_url_from_env(),
            model: model.into(),
            http_client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> EvalResult<Vec<f32>> {
        let response = self
            .http_client
            .post(format!("{}/api/embed", self.base_url))
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| EvalError::Encoding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Encoding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| EvalError::Encoding(format!("Invalid embed response: {}", e)))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EvalError::Encoding("No embeddings in response".to_string()))
    }
}

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAIEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    http_client: Client,
}

impl OpenAIEmbedder {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            http_client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OpenAIEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> EvalResult<Vec<f32>> {
        let mut request = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .json(&OpenAIEmbedRequest {
                model: &self.model,
                input: text,
            });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| EvalError::Encoding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Encoding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: OpenAIEmbedResponse = response
            .json()
            .await
            .map_err(|e| EvalError::Encoding(format!("Invalid embeddings response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EvalError::Encoding("No embedding data in response".to_string()))
    }
}

/// Build the configured embedder.
///
/// The OpenAI backend reads `OPENAI_API_KEY`; it may be empty when
/// `base_url` points at a local compatible server.
pub fn create_embedder(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    match config.backend {
        ProviderKind::Ollama => {
            let mut embedder = OllamaEmbedder::new(&config.model);
            if let Some(url) = &config.base_url {
                embedder = embedder.with_base_url(url);
            }
            Arc::new(embedder)
        }
        ProviderKind::OpenAI => {
            let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
            if api_key.is_empty() && config.base_url.is_none() {
                tracing::warn!("OPENAI_API_KEY not set; embedding requests will be rejected");
            }
            let mut embedder = OpenAIEmbedder::new(api_key, &config.model);
            if let Some(url) = &config.base_url {
                embedder = embedder.with_base_url(url);
            }
            Arc::new(embedder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::serve;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_ollama_embed() {
        let app = Router::new().route(
            "/api/embed",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "all-minilm");
                assert_eq!(body["input"], "Paris");
                Json(json!({"model": "all-minilm", "embeddings": [[0.5, 0.25, -1.0]]}))
            }),
        );
        let base = serve(app).await;

        let embedder = OllamaEmbedder::new("all-minilm").with_base_url(base);
        assert_eq!(embedder.embed("Paris").await.unwrap(), vec![0.5, 0.25, -1.0]);
        assert_eq!(embedder.model_id(), "all-minilm");
    }

    #[tokio::test]
    async fn test_ollama_empty_embeddings_is_encoding_error() {
        let app = Router::new().route(
            "/api/embed",
            post(|| async { Json(json!({"embeddings": []})) }),
        );
        let base = serve(app).await;

        let embedder = OllamaEmbedder::new("all-minilm").with_base_url(base);
        assert!(matches!(embedder.embed("x").await, Err(EvalError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_openai_embed_and_http_error() {
        let app = Router::new()
            .route(
                "/v1/embeddings",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["model"], "text-embedding-3-small");
                    Json(json!({"data": [{"index": 0, "embedding": [1.0, 0.0]}]}))
                }),
            )
            .route(
                "/broken/embeddings",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let base = serve(app).await;

        let embedder = OpenAIEmbedder::new(String::new(), "text-embedding-3-small")
            .with_base_url(format!("{}/v1", base));
        assert_eq!(embedder.embed("hi").await.unwrap(), vec![1.0, 0.0]);

        let broken = OpenAIEmbedder::new(String::new(), "text-embedding-3-small")
            .with_base_url(format!("{}/broken", base));
        let err = broken.embed("hi").await.unwrap_err();
        assert!(matches!(err, EvalError::Encoding(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_encoding_error() {
        // Port 9 (discard) is not expected to be serving HTTP
        let embedder = OllamaEmbedder::new("all-minilm").with_base_url("http://127.0.0.1:9");
        assert!(matches!(embedder.embed("x").await, Err(EvalError::Encoding(_))));
    }

    #[test]
    fn test_create_embedder_from_config() {
        let config = EmbeddingConfig {
            model: "nomic-embed-text".to_string(),
            ..EmbeddingConfig::default()
        };
        assert_eq!(create_embedder(&config).model_id(), "nomic-embed-text");
    }
}
