//! Error types for scoring backends and record loading

/// Failure of an embedding or syntactic-analysis backend on one input.
///
/// These are fatal to the item being evaluated and nothing else; the batch
/// evaluator records them as an outcome and moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Embedding failed: {0}")]
    Encoding(String),

    #[error("Syntactic analysis failed: {0}")]
    Analysis(String),

    #[error("Embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Error type for reading record files
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
