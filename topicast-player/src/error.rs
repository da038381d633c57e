//! Error types for topicast-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Timing-tier misses and stale-job payloads are not errors
//! (they fall through or are dropped); this type covers the failures that
//! genuinely stop an operation.

use thiserror::Error;

/// Main error type for topicast-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport errors from the job backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Job-level errors reported by the backend
    #[error("Job error: {0}")]
    Job(String),

    /// Audio engine command failures
    #[error("Audio engine error: {0}")]
    Engine(#[from] crate::engine::EngineError),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using topicast-player Error
pub type Result<T> = std::result::Result<T, Error>;
