//! Response collection engine

pub mod executor;
pub mod rate_limiter;

pub use executor::{
    collect_responses, CollectedResponses, ConsoleProgress, Executor, ExecutorConfig,
    NoOpProgress, OracleAnswer, OracleUsage, ProgressCallback, ResponseOracle,
};
pub use rate_limiter::RateLimiter;
