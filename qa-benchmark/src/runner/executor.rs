//! Query execution against the question-answering model

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use verdict::Response;

use crate::config::OracleConfig;
use crate::providers::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

/// One answer from the oracle with what it cost
#[derive(Debug, Clone, PartialEq)]
pub struct OracleAnswer {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Latency of the successful attempt
    pub latency_ms: u64,
    /// The model stopped at the token limit
    pub truncated: bool,
}

impl From<CompletionResponse> for OracleAnswer {
    fn from(response: CompletionResponse) -> Self {
        Self {
            truncated: response.finish_reason == "length",
            text: response.content,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            latency_ms: response.latency_ms,
        }
    }
}

/// Anything that can answer a question with free text
#[async_trait]
pub trait ResponseOracle: Send + Sync {
    /// Model identifier shown in reports
    fn model(&self) -> &str;

    async fn ask(&self, question: &str) -> ProviderResult<OracleAnswer>;
}

/// Totals over one response collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OracleUsage {
    pub answered: usize,
    pub failed: usize,
    pub truncated: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_latency_ms: u64,
}

impl OracleUsage {
    fn record(&mut self, answer: &OracleAnswer) {
        self.answered += 1;
        if answer.truncated {
            self.truncated += 1;
        }
        self.input_tokens += answer.input_tokens as u64;
        self.output_tokens += answer.output_tokens as u64;
        self.total_latency_ms += answer.latency_ms;
    }

    /// Mean latency of answered questions
    pub fn mean_latency_ms(&self) -> Option<f64> {
        (self.answered > 0).then(|| self.total_latency_ms as f64 / self.answered as f64)
    }
}

/// Responses in question order plus usage totals
#[derive(Debug, Clone)]
pub struct CollectedResponses {
    pub responses: Vec<Response>,
    pub usage: OracleUsage,
}

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Questions in flight at once
    pub parallel_requests: usize,
    /// Number of retries on failure
    pub retry_count: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_requests: 1,
            retry_count: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 60_000,
            timeout_ms: 120_000,
            max_tokens: 1024,
            temperature: None,
            system_prompt: None,
        }
    }
}

impl From<&OracleConfig> for ExecutorConfig {
    fn from(config: &OracleConfig) -> Self {
        Self {
            parallel_requests: 1,
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            max_retry_delay_ms: config.max_retry_delay_ms,
            timeout_ms: config.timeout_ms,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

impl ExecutorConfig {
    pub fn with_parallel_requests(mut self, n: usize) -> Self {
        self.parallel_requests = n.max(1);
        self
    }
}

/// Sends questions to a provider with rate limiting, timeouts and retries
pub struct Executor {
    config: ExecutorConfig,
    provider: Arc<dyn LLMProvider>,
}

impl Executor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        Self { config, provider }
    }

    fn request_for(&self, question: &str) -> CompletionRequest {
        let mut request =
            CompletionRequest::new(vec![Message::user(question)], self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(system) = &self.config.system_prompt {
            request = request.with_system(system);
        }
        request
    }

    /// Try to answer once. Waiting on the rate limiter does not count
    /// against the timeout.
    async fn try_execute(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        self.provider.rate_limiter().acquire().await;

        let timeout = Duration::from_millis(self.config.timeout_ms);

        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }
}

#[async_trait]
impl ResponseOracle for Executor {
    fn model(&self) -> &str {
        self.provider.default_model()
    }

    async fn ask(&self, question: &str) -> ProviderResult<OracleAnswer> {
        let request = self.request_for(question);
        let mut last_error = None;
        let mut delay = self.config.retry_delay_ms;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tracing::info!("Retry {} on {}", attempt, self.provider.name());
                sleep(Duration::from_millis(delay)).await;
                delay = (delay * 2).min(self.config.max_retry_delay_ms);
            }

            match self.try_execute(&request).await {
                Ok(response) => {
                    let answer = OracleAnswer::from(response);
                    if answer.truncated {
                        tracing::warn!(
                            "Answer cut off at {} tokens; raise max_tokens to avoid this",
                            self.config.max_tokens
                        );
                    }
                    return Ok(answer);
                }
                Err(ProviderError::RateLimited { retry_after_ms }) => {
                    tracing::warn!(
                        "Rate limited on {}, waiting {}ms",
                        self.provider.name(),
                        retry_after_ms
                    );
                    sleep(Duration::from_millis(retry_after_ms)).await;
                    last_error = Some(ProviderError::RateLimited { retry_after_ms });
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!("Error on {}: {}", self.provider.name(), e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error on {}: {}", self.provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Config("no attempts made".to_string())))
    }
}

/// Ask every question, keeping input order.
///
/// A question the oracle could not answer becomes
/// [`Response::Unavailable`] and the rest of the run continues.
pub async fn collect_responses(
    oracle: &dyn ResponseOracle,
    questions: &[String],
    parallel_requests: usize,
    progress: &dyn ProgressCallback,
) -> CollectedResponses {
    let total = questions.len();

    let mut answers = stream::iter(questions.iter().enumerate())
        .map(|(index, question)| async move {
            progress.on_question_start(index, total);
            (index, oracle.ask(question).await)
        })
        .buffered(parallel_requests.max(1));

    let mut responses = Vec::with_capacity(total);
    let mut usage = OracleUsage::default();
    while let Some((index, answer)) = answers.next().await {
        let response = match answer {
            Ok(answer) => {
                usage.record(&answer);
                Response::Obtained(answer.text)
            }
            Err(e) => {
                tracing::error!("No response for question {}: {}", index + 1, e);
                usage.failed += 1;
                Response::Unavailable(e.to_string())
            }
        };
        progress.on_question_complete(index, matches!(response, Response::Obtained(_)));
        responses.push(response);
        progress.on_progress(responses.len(), total);
    }

    CollectedResponses { responses, usage }
}

/// Progress callback for tracking response collection
pub trait ProgressCallback: Send + Sync {
    fn on_question_start(&self, index: usize, total: usize);
    fn on_question_complete(&self, index: usize, success: bool);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_question_start(&self, _index: usize, _total: usize) {}
    fn on_question_complete(&self, _index: usize, _success: bool) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_question_start(&self, index: usize, total: usize) {
        eprintln!("  Asking question {}/{}...", index + 1, total);
    }

    fn on_question_complete(&self, index: usize, success: bool) {
        if !success {
            eprintln!("  FAILED question {}", index + 1);
        }
    }

    fn on_progress(&self, _completed: usize, _total: usize) {}
}
