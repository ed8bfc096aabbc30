//! Results reporting

pub mod console;

pub use console::PacedObserver;

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use verdict::{
    EvaluationMode, EvaluationRecord, EvaluationReport, EvaluationSummary, Thresholds,
};

use crate::runner::OracleUsage;

/// JSON export of a full run
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub run_id: String,
    pub timestamp: String,
    /// Model that produced the responses, if it was queried in this run
    pub oracle_model: Option<String>,
    pub embedding_model: String,
    pub mode: EvaluationMode,
    pub thresholds: Thresholds,
    pub records: Vec<EvaluationRecord>,
    pub summary: EvaluationSummary,
    /// Token and latency totals when responses came from the oracle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_usage: Option<OracleUsage>,
}

impl JsonReport {
    pub fn new(
        run_id: impl Into<String>,
        oracle_model: Option<String>,
        embedding_model: impl Into<String>,
        mode: EvaluationMode,
        thresholds: Thresholds,
        report: EvaluationReport,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            oracle_model,
            embedding_model: embedding_model.into(),
            mode,
            thresholds,
            records: report.records,
            summary: report.summary,
            oracle_usage: None,
        }
    }

    pub fn with_oracle_usage(mut self, usage: Option<OracleUsage>) -> Self {
        self.oracle_usage = usage;
        self
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Write as `<dir>/<run_id>.json`, creating `dir` if needed
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.run_id));
        self.write_to_file(&path)?;
        Ok(path)
    }
}

/// Run id derived from the current UTC time
pub fn new_run_id() -> String {
    chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

/// One item in the console layout
pub fn write_record(out: &mut impl Write, record: &EvaluationRecord) -> io::Result<()> {
    writeln!(out, "Question: {}", record.question)?;
    match &record.response {
        Some(response) => writeln!(out, "Response: {}", response)?,
        None => writeln!(out, "Response: <none>")?,
    }
    writeln!(out, "Correct Answer: {}", record.reference)?;
    writeln!(out, "Result: {}", record.result_label())?;
    writeln!(out)
}

/// Summary block; `model` is printed as the header line when known
pub fn write_summary(
    out: &mut impl Write,
    model: Option<&str>,
    summary: &EvaluationSummary,
) -> io::Result<()> {
    if let Some(model) = model {
        writeln!(out, "{}", model)?;
    }
    writeln!(
        out,
        "Summary: {} out of {} questions were answered correctly.",
        summary.correct, summary.scored
    )?;
    match summary.accuracy_percent {
        Some(accuracy) => writeln!(out, "Accuracy: {:.2}%", accuracy)?,
        None => writeln!(out, "Accuracy: undefined")?,
    }

    let unscored = summary.encoding_failures + summary.missing_responses;
    if unscored > 0 {
        writeln!(
            out,
            "Not scored: {} (encoding failed: {}, no response: {})",
            unscored, summary.encoding_failures, summary.missing_responses
        )?;
    }
    if let Some(warning) = &summary.alignment {
        writeln!(out, "Warning: {}", warning)?;
    }
    Ok(())
}

/// Oracle totals for a collection pass
pub fn write_usage(out: &mut impl Write, usage: &OracleUsage) -> io::Result<()> {
    writeln!(
        out,
        "Oracle: {} answered, {} failed, {} cut off at max_tokens",
        usage.answered, usage.failed, usage.truncated
    )?;
    writeln!(
        out,
        "Tokens: {} in, {} out",
        usage.input_tokens, usage.output_tokens
    )?;
    if let Some(mean) = usage.mean_latency_ms() {
        writeln!(out, "Mean latency: {:.0}ms", mean)?;
    }
    Ok(())
}

/// Print a finished report to stdout
pub fn print_console_report(model: Option<&str>, report: &EvaluationReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &report.records {
        write_record(&mut out, record)?;
    }
    write_summary(&mut out, model, &report.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict::{AlignmentWarning, Evidence, Outcome, ScoreBundle, Verdict};

    fn scored(index: usize, correct: bool) -> EvaluationRecord {
        EvaluationRecord {
            index,
            question: "What is the capital of France?".to_string(),
            response: Some("Paris.".to_string()),
            reference: "Paris is the capital of France.".to_string(),
            outcome: Outcome::Scored {
                verdict: Verdict::from_bool(correct),
                evidence: Evidence::Combined(ScoreBundle {
                    overlap_ratio: 0.5,
                    similarity: 0.9,
                }),
            },
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_record_layout() {
        let text = render(|out| write_record(out, &scored(0, true)));
        assert_eq!(
            text,
            "Question: What is the capital of France?\n\
             Response: Paris.\n\
             Correct Answer: Paris is the capital of France.\n\
             Result: Correct\n\n"
        );
    }

    #[test]
    fn test_missing_response_layout() {
        let record = EvaluationRecord {
            response: None,
            outcome: Outcome::NoResponse {
                reason: "Timeout after 500ms".to_string(),
            },
            ..scored(1, false)
        };
        let text = render(|out| write_record(out, &record));
        assert!(text.contains("Response: <none>\n"));
        assert!(text.contains("Result: No response\n"));
    }

    #[test]
    fn test_summary_layout() {
        let records = vec![scored(0, true), scored(1, false), scored(2, true)];
        let summary = EvaluationSummary::from_records(&records, None);
        let text = render(|out| write_summary(out, Some("llama3"), &summary));
        assert_eq!(
            text,
            "llama3\n\
             Summary: 2 out of 3 questions were answered correctly.\n\
             Accuracy: 66.67%\n"
        );
    }

    #[test]
    fn test_degenerate_summary_with_warning() {
        let summary = EvaluationSummary::from_records(&[], AlignmentWarning::check(2, 2, 0));
        let text = render(|out| write_summary(out, None, &summary));
        assert!(text.starts_with("Summary: 0 out of 0"));
        assert!(text.contains("Accuracy: undefined\n"));
        assert!(text.contains("Warning: "));
    }

    #[test]
    fn test_json_report_written_by_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![scored(0, true)];
        let summary = EvaluationSummary::from_records(&records, None);
        let report = JsonReport::new(
            "20260101-000000",
            Some("llama3".to_string()),
            "all-minilm",
            EvaluationMode::Combined,
            Thresholds::default(),
            EvaluationReport { records, summary },
        );

        let path = report.write_to_dir(dir.path().join("runs")).unwrap();
        assert!(path.ends_with("runs/20260101-000000.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mode"], "combined");
        assert_eq!(value["summary"]["correct"], 1);
        assert_eq!(value["records"][0]["outcome"]["status"], "scored");
        assert_eq!(value["thresholds"]["combined_overlap"], 0.4);
        assert!(value.get("oracle_usage").is_none());
    }

    #[test]
    fn test_json_report_carries_oracle_usage() {
        let usage = OracleUsage {
            answered: 2,
            failed: 1,
            truncated: 1,
            input_tokens: 40,
            output_tokens: 12,
            total_latency_ms: 900,
        };
        let report = JsonReport::new(
            "run",
            Some("llama3".to_string()),
            "all-minilm",
            EvaluationMode::Combined,
            Thresholds::default(),
            EvaluationReport {
                records: Vec::new(),
                summary: EvaluationSummary::from_records(&[], None),
            },
        )
        .with_oracle_usage(Some(usage.clone()));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["oracle_usage"]["output_tokens"], 12);
        assert_eq!(value["oracle_usage"]["truncated"], 1);

        let text = render(|out| write_usage(out, &usage));
        assert_eq!(
            text,
            "Oracle: 2 answered, 1 failed, 1 cut off at max_tokens\n\
             Tokens: 40 in, 12 out\n\
             Mean latency: 450ms\n"
        );
    }
}
