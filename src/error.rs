//! Error types for configuration and run failures.

use thiserror::Error;

/// Configuration that can never complete; rejected before any thread starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("agents must be > 0")]
    NoAgents,
    #[error("customers_per_agent must be > 0")]
    NoCustomersPerAgent,
    #[error("agents ({agents}) x customers_per_agent ({per_agent}) overflows")]
    TotalOverflow { agents: usize, per_agent: usize },
    #[error(
        "total customers ({total}) does not match agents ({agents}) x customers_per_agent ({per_agent})"
    )]
    QuotaMismatch {
        total: usize,
        agents: usize,
        per_agent: usize,
    },
    #[error("workers ({workers}) must exceed agents + greeter ({required_over})")]
    PoolTooSmall { workers: usize, required_over: usize },
    #[error("{name} delay range is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvertedDelay {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("worker pool is shutting down; job rejected")]
    PoolClosed,
    #[error("{0} worker thread(s) panicked")]
    WorkerPanicked(usize),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
    #[error("failed writing output: {0}")]
    Output(#[from] std::io::Error),
    #[error("role outcome missing: expected {expected}, received {received}")]
    MissingOutcome { expected: usize, received: usize },
}
