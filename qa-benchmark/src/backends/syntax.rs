//! Client for a spaCy-style dependency parse service
//!
//! The service accepts `POST /parse` with `{"model": ..., "text": ...}` and
//! answers with one entry per token:
//!
//! ```json
//! {"tokens": [{"i": 0, "text": "Paris", "dep": "nsubj", "head": 1}, ...]}
//! ```
//!
//! `head` is the index of the governing token; the root points at itself.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use verdict::{EvalError, EvalResult, ParsedToken, SyntaxAnalyzer};

use crate::config::SyntaxConfig;

pub struct HttpSyntaxAnalyzer {
    base_url: String,
    model: String,
    http_client: Client,
}

impl HttpSyntaxAnalyzer {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &SyntaxConfig) -> Self {
        Self::new(&config.base_url, &config.model)
    }
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    tokens: Vec<WireToken>,
}

#[derive(Debug, Deserialize)]
struct WireToken {
    i: usize,
    text: String,
    dep: String,
    head: usize,
}

/// Order tokens by `i` and rewrite heads as positions in that order.
/// A head that names no token is treated as a self-loop.
fn into_parsed(mut tokens: Vec<WireToken>) -> Vec<ParsedToken> {
    tokens.sort_by_key(|t| t.i);
    let position: HashMap<usize, usize> = tokens
        .iter()
        .enumerate()
        .map(|(pos, t)| (t.i, pos))
        .collect();

    tokens
        .into_iter()
        .enumerate()
        .map(|(pos, t)| {
            let head = position.get(&t.head).copied().unwrap_or(pos);
            ParsedToken::new(t.text, &t.dep, head)
        })
        .collect()
}

#[async_trait]
impl SyntaxAnalyzer for HttpSyntaxAnalyzer {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, text: &str) -> EvalResult<Vec<ParsedToken>> {
        let response = self
            .http_client
            .post(format!("{}/parse", self.base_url))
            .json(&ParseRequest {
                model: &self.model,
                text,
            })
            .send()
            .await
            .map_err(|e| EvalError::Analysis(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Analysis(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ParseResponse = response
            .json()
            .await
            .map_err(|e| EvalError::Analysis(format!("Invalid parse response: {}", e)))?;

        Ok(into_parsed(parsed.tokens))
    }
}
