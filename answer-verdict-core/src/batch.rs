//! Batch evaluation over aligned (question, response, reference) triples

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{EvaluationMode, Evidence, Verdict, VerdictEngine};
use crate::observer::{EvaluationObserver, NoOpObserver};

/// A response as obtained from the question-answering oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Response {
    Obtained(String),
    /// The oracle failed or timed out; holds the reason
    Unavailable(String),
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Response::Obtained(text)
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Response::Obtained(text.to_string())
    }
}

/// Result of evaluating one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Scored { verdict: Verdict, evidence: Evidence },
    /// Embedding or parsing backend failed on this item
    EncodingFailed { error: String },
    /// No response was obtained for the question
    NoResponse { reason: String },
}

/// One evaluated item, in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub index: usize,
    pub question: String,
    pub response: Option<String>,
    pub reference: String,
    pub outcome: Outcome,
}

impl EvaluationRecord {
    pub fn is_correct(&self) -> bool {
        matches!(&self.outcome, Outcome::Scored { verdict, .. } if verdict.is_correct())
    }

    /// Human-readable outcome label
    pub fn result_label(&self) -> &'static str {
        match &self.outcome {
            Outcome::Scored { verdict, .. } => verdict.label().as_str(),
            Outcome::EncodingFailed { .. } => "Encoding failed",
            Outcome::NoResponse { .. } => "No response",
        }
    }
}

/// Input sequences had different lengths; only the common prefix was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentWarning {
    pub questions: usize,
    pub responses: usize,
    pub references: usize,
    pub evaluated: usize,
}

impl AlignmentWarning {
    pub fn check(questions: usize, responses: usize, references: usize) -> Option<Self> {
        if questions == responses && responses == references {
            return None;
        }
        Some(Self {
            questions,
            responses,
            references,
            evaluated: questions.min(responses).min(references),
        })
    }
}

impl std::fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} questions, {} responses, {} references; evaluated the first {}",
            self.questions, self.responses, self.references, self.evaluated
        )
    }
}

/// Aggregate statistics for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    /// Items evaluated, whatever their outcome
    pub total: usize,
    /// Items that reached a verdict
    pub scored: usize,
    pub correct: usize,
    pub encoding_failures: usize,
    pub missing_responses: usize,
    /// `100 * correct / scored`; `None` when nothing was scored
    pub accuracy_percent: Option<f64>,
    pub alignment: Option<AlignmentWarning>,
}

impl EvaluationSummary {
    pub fn from_records(records: &[EvaluationRecord], alignment: Option<AlignmentWarning>) -> Self {
        let mut scored = 0;
        let mut correct = 0;
        let mut encoding_failures = 0;
        let mut missing_responses = 0;

        for record in records {
            match &record.outcome {
                Outcome::Scored { verdict, .. } => {
                    scored += 1;
                    if verdict.is_correct() {
                        correct += 1;
                    }
                }
                Outcome::EncodingFailed { .. } => encoding_failures += 1,
                Outcome::NoResponse { .. } => missing_responses += 1,
            }
        }

        let accuracy_percent = if scored > 0 {
            Some(100.0 * correct as f64 / scored as f64)
        } else {
            None
        };

        Self {
            total: records.len(),
            scored,
            correct,
            encoding_failures,
            missing_responses,
            accuracy_percent,
            alignment,
        }
    }

    /// True when no item reached a verdict and accuracy is undefined
    pub fn is_degenerate(&self) -> bool {
        self.accuracy_percent.is_none()
    }
}

/// Records plus summary for one run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub records: Vec<EvaluationRecord>,
    pub summary: EvaluationSummary,
}

/// Drives the verdict engine over a batch of items
pub struct BatchEvaluator {
    engine: Arc<VerdictEngine>,
    concurrency: usize,
}

impl BatchEvaluator {
    /// Create a sequential evaluator
    pub fn new(engine: Arc<VerdictEngine>) -> Self {
        Self {
            engine,
            concurrency: 1,
        }
    }

    /// Evaluate up to `concurrency` items at once. Records still come out
    /// in input order and the report is identical to a sequential run.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn engine(&self) -> &VerdictEngine {
        &self.engine
    }

    /// Evaluate all aligned triples.
    ///
    /// Sequences are paired by index. If their lengths differ, only the
    /// shortest common prefix is evaluated and the summary carries an
    /// [`AlignmentWarning`].
    pub async fn run_all(
        &self,
        questions: &[String],
        responses: &[Response],
        references: &[String],
        mode: EvaluationMode,
    ) -> EvaluationReport {
        self.run_all_observed(questions, responses, references, mode, &NoOpObserver)
            .await
    }

    /// Like [`run_all`](Self::run_all), handing each record to `observer`
    /// as soon as it is produced and the summary at the end.
    pub async fn run_all_observed(
        &self,
        questions: &[String],
        responses: &[Response],
        references: &[String],
        mode: EvaluationMode,
        observer: &dyn EvaluationObserver,
    ) -> EvaluationReport {
        let alignment = AlignmentWarning::check(questions.len(), responses.len(), references.len());
        if let Some(warning) = &alignment {
            tracing::warn!("Input length mismatch: {}", warning);
        }
        let count = questions.len().min(responses.len()).min(references.len());

        tracing::info!(
            "Evaluating {} items ({} mode, concurrency {})",
            count,
            mode,
            self.concurrency
        );

        let mut items = stream::iter(0..count)
            .map(|idx| {
                self.evaluate_item(idx, &questions[idx], &responses[idx], &references[idx], mode)
            })
            .buffered(self.concurrency);

        let mut records = Vec::with_capacity(count);
        while let Some(record) = items.next().await {
            observer.on_record(&record).await;
            records.push(record);
        }

        let summary = EvaluationSummary::from_records(&records, alignment);
        observer.on_summary(&summary).await;

        EvaluationReport { records, summary }
    }

    async fn evaluate_item(
        &self,
        index: usize,
        question: &str,
        response: &Response,
        reference: &str,
        mode: EvaluationMode,
    ) -> EvaluationRecord {
        let (response, outcome) = match response {
            Response::Unavailable(reason) => (
                None,
                Outcome::NoResponse {
                    reason: reason.clone(),
                },
            ),
            Response::Obtained(text) => {
                let outcome = match self.engine.evaluate(text, reference, mode).await {
                    Ok(judgement) => Outcome::Scored {
                        verdict: judgement.verdict,
                        evidence: judgement.evidence,
                    },
                    Err(e) => {
                        tracing::error!("Item {} could not be scored: {}", index, e);
                        Outcome::EncodingFailed {
                            error: e.to_string(),
                        }
                    }
                };
                (Some(text.clone()), outcome)
            }
        };

        EvaluationRecord {
            index,
            question: question.to_string(),
            response,
            reference: reference.to_string(),
            outcome,
        }
    }
}
