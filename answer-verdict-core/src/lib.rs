//! Answer-evaluation engine
//!
//! Decides whether a free-text response from a question-answering agent
//! matches a reference answer, and aggregates those decisions into an
//! accuracy statistic.
//!
//! # Pipeline
//!
//! ```text
//! (response, reference) -> [assertion extraction] -> scoring -> verdict -> summary
//! ```
//!
//! - [`overlap`]: case-insensitive bag-of-words intersection ratio
//! - [`extract`]: dependency-parse heuristic that reduces a sentence to its claim
//! - [`similarity`]: cosine similarity between embeddings
//! - [`engine`]: threshold logic for the two evaluation modes
//! - [`batch`]: positional pairing, per-item outcomes and the summary
//!
//! Backends (embedding model, syntactic analyzer) are trait objects passed in
//! by the caller; nothing in this crate holds global model state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verdict::{BatchEvaluator, EvaluationMode, IdentityExtractor, Response, VerdictEngine};
//! # use verdict::{Embedder, EvalResult};
//! # struct MyEmbedder;
//! # #[async_trait::async_trait]
//! # impl Embedder for MyEmbedder {
//! #     fn model_id(&self) -> &str { "stub" }
//! #     async fn embed(&self, _text: &str) -> EvalResult<Vec<f32>> { Ok(vec![1.0]) }
//! # }
//!
//! # async fn demo() {
//! let engine = VerdictEngine::new(Arc::new(MyEmbedder), Arc::new(IdentityExtractor));
//! let evaluator = BatchEvaluator::new(Arc::new(engine));
//!
//! let questions = vec!["What is the capital of France?".to_string()];
//! let responses = vec![Response::from("The capital of France is Paris.")];
//! let references = vec!["Paris is the capital of France.".to_string()];
//!
//! let report = evaluator
//!     .run_all(&questions, &responses, &references, EvaluationMode::Combined)
//!     .await;
//! println!("{:?}", report.summary.accuracy_percent);
//! # }
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod extract;
pub mod observer;
pub mod overlap;
pub mod records;
pub mod similarity;

pub use batch::{
    AlignmentWarning, BatchEvaluator, EvaluationRecord, EvaluationReport, EvaluationSummary,
    Outcome, Response,
};
pub use engine::{
    EvaluationMode, Evidence, Judgement, Label, ScoreBundle, Thresholds, Verdict, VerdictEngine,
};
pub use error::{EvalError, EvalResult, RecordError};
pub use extract::{
    assertion_from_parse, Assertion, DepRole, DependencyExtractor, Extractor, IdentityExtractor,
    ParsedToken, SyntaxAnalyzer,
};
pub use observer::{EvaluationObserver, NoOpObserver};
pub use overlap::overlap;
pub use records::{parse_records, read_records};
pub use similarity::{cosine_similarity, Embedder, SemanticScorer};
