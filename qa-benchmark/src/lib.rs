//! Question-answering accuracy benchmark
//!
//! Asks a chat model each question from a record file, grades the answers
//! against a reference key with the `verdict` engine and reports per-item
//! results and overall accuracy.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use qa_benchmark::{
//!     backends::build_engine,
//!     config::Config,
//!     providers::create_provider,
//!     runner::{collect_responses, Executor, ExecutorConfig, NoOpProgress},
//! };
//! use verdict::{read_records, BatchEvaluator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let questions = read_records("questions.txt")?;
//!     let answers = read_records("answers.txt")?;
//!
//!     let provider = create_provider(&config.oracle)?;
//!     let executor = Executor::new(provider, ExecutorConfig::from(&config.oracle));
//!     let collected = collect_responses(&executor, &questions, 1, &NoOpProgress).await;
//!
//!     let evaluator = BatchEvaluator::new(Arc::new(build_engine(&config)));
//!     let report = evaluator
//!         .run_all(&questions, &collected.responses, &answers, config.evaluation.mode)
//!         .await;
//!     println!("{:?}", report.summary.accuracy_percent);
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod config;
pub mod providers;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::backends::{build_engine, create_embedder, HttpSyntaxAnalyzer};
    pub use crate::config::{Config, ProviderKind};
    pub use crate::providers::{
        create_provider, CompletionRequest, CompletionResponse, LLMProvider, Message,
        ProviderError, ProviderResult,
    };
    pub use crate::reporting::{print_console_report, JsonReport, PacedObserver};
    pub use crate::runner::{
        collect_responses, CollectedResponses, Executor, ExecutorConfig, OracleUsage,
        ResponseOracle,
    };
}
