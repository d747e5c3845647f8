//! Engine-level error type.
//!
//! [`EngineError`] aggregates the failure domains an engine touches (graph
//! mutation, buffer pool, worker pool, configuration) so callers deal with
//! one error type at the facade boundary.

use thiserror::Error;

use resonar_core::{GraphError, PoolError};

use crate::config::ConfigError;
use crate::workers::WorkerPoolError;

/// Errors surfaced by [`AudioEngine`](crate::AudioEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A graph mutation was rejected.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The buffer pool could not satisfy a request.
    #[error("buffer pool error: {0}")]
    Pool(#[from] PoolError),

    /// The worker pool refused a task or failed to start.
    #[error("worker pool error: {0}")]
    Workers(#[from] WorkerPoolError),

    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The engine's graph has no prepared buffer pool.
    #[error("engine is not prepared")]
    NotPrepared,
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
