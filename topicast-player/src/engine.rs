//! Audio engine and URL resolution collaborator contracts
//!
//! The engine does not decode or output audio itself; it drives an external
//! playback engine through this trait. Commands are non-blocking and may be
//! rejected (e.g. a source index that a racing queue mutation just
//! invalidated); callers treat rejection as a tier boundary, not a fault.

use thiserror::Error;
use tokio::sync::broadcast;

pub mod simulated;

/// Command failures reported by an audio engine implementation
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Source index outside the currently attached queue
    #[error("invalid source index: {0}")]
    InvalidSourceIndex(usize),

    /// Command requires an attached source
    #[error("no source attached")]
    NoSource,

    /// Implementation-specific rejection
    #[error("engine rejected command: {0}")]
    Rejected(String),
}

/// Playback events emitted by an audio engine
///
/// Four independent streams in the underlying playback APIs; multiplexed
/// over one broadcast channel here so consumers keep ordering per event
/// kind without juggling four receivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Playback position within the current source
    Position { position_ms: u64 },
    /// Total known duration of the attached source list
    Duration { duration_ms: u64 },
    /// Playing/paused transition
    PlayState { playing: bool },
    /// Index of the source currently feeding output
    CurrentSourceIndex { source_index: Option<usize> },
}

/// External playback engine contract
pub trait AudioEngine: Send + Sync {
    /// Replace the attached content with a single source.
    fn set_single_source(&self, url: &str) -> std::result::Result<(), EngineError>;

    /// Replace the attached content with an ordered source list.
    fn set_queue_sources(&self, urls: Vec<String>) -> std::result::Result<(), EngineError>;

    /// Append one source to the end of the live source list.
    fn append_to_queue(&self, url: &str) -> std::result::Result<(), EngineError>;

    /// Seek to `offset_ms`, either within the source at `source_index` or
    /// absolutely when no index is given.
    fn seek(&self, offset_ms: u64, source_index: Option<usize>)
        -> std::result::Result<(), EngineError>;

    fn play(&self) -> std::result::Result<(), EngineError>;

    fn pause(&self) -> std::result::Result<(), EngineError>;

    /// Playback speed factor (1.0 = normal).
    fn set_speed(&self, factor: f64) -> std::result::Result<(), EngineError>;

    /// Subscribe to the engine's event stream.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Resolves backend-relative audio paths to absolute URLs
pub trait UrlResolver: Send + Sync {
    fn resolve(&self, path_or_url: &str) -> String;
}

/// Resolver rooted at the generation backend's base URL
///
/// Already-absolute URLs pass through; root-relative paths (the backend
/// reports `audio_url` as `/audio/<file>`) are joined to the base; bare
/// chunk filenames are served from the backend's `/audio` mount.
#[derive(Debug, Clone)]
pub struct BaseUrlResolver {
    base_url: String,
}

impl BaseUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl UrlResolver for BaseUrlResolver {
    fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else if path_or_url.starts_with('/') {
            format!("{}{}", self.base_url, path_or_url)
        } else {
            format!("{}/audio/{}", self.base_url, path_or_url)
        }
    }
}
