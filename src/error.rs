//! # Engine Errors
//!
//! Recoverable failures surfaced by the engine. Only resource problems live
//! here (cache I/O, malformed cache files, saturated task queues, bad
//! configuration). Broken spatial-index invariants are not errors: they panic
//! at the point of violation.

use thiserror::Error;

/// Errors that can occur while running the voxel engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("chunk cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cached chunk has size {actual}, expected {expected}")]
    ChunkSizeMismatch { expected: i32, actual: i32 },

    #[error("cached chunk is corrupt: {0}")]
    CorruptChunk(String),

    #[error("task queue is full ({capacity} jobs waiting)")]
    TaskQueueFull { capacity: usize },

    #[error("owning worker thread is no longer running")]
    WorkerDisconnected,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Shorthand for results carrying an [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;
