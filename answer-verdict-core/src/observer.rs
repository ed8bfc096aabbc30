//! Subscribers to a running evaluation

use async_trait::async_trait;

use crate::batch::{EvaluationRecord, EvaluationSummary};

/// Receives records as the batch evaluator produces them.
///
/// `on_record` is awaited before the next item is handed over, so a
/// subscriber can pace or pause the run without the evaluator knowing.
#[async_trait]
pub trait EvaluationObserver: Send + Sync {
    async fn on_record(&self, record: &EvaluationRecord);

    async fn on_summary(&self, summary: &EvaluationSummary);
}

/// Observer that ignores everything
pub struct NoOpObserver;

#[async_trait]
impl EvaluationObserver for NoOpObserver {
    async fn on_record(&self, _record: &EvaluationRecord) {}
    async fn on_summary(&self, _summary: &EvaluationSummary) {}
}
