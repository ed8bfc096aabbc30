//! Step-by-step console display

use async_trait::async_trait;
use std::io::{self, Write};
use std::time::Duration;

use verdict::{EvaluationObserver, EvaluationRecord, EvaluationSummary};

use super::{write_record, write_summary};

/// Prints each record as it is produced, pausing between items
pub struct PacedObserver {
    model: Option<String>,
    pace: Duration,
}

impl PacedObserver {
    pub fn new(model: Option<String>) -> Self {
        Self {
            model,
            pace: Duration::ZERO,
        }
    }

    /// Delay after each record; zero prints without pausing
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

#[async_trait]
impl EvaluationObserver for PacedObserver {
    async fn on_record(&self, record: &EvaluationRecord) {
        {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if let Err(e) = write_record(&mut out, record).and_then(|_| out.flush()) {
                tracing::warn!("Failed to print record {}: {}", record.index, e);
            }
        }
        if !self.pace.is_zero() {
            tokio::time::sleep(self.pace).await;
        }
    }

    async fn on_summary(&self, summary: &EvaluationSummary) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = write_summary(&mut out, self.model.as_deref(), summary) {
            tracing::warn!("Failed to print summary: {}", e);
        }
    }
}
