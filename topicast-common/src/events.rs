//! Player event types
//!
//! Events broadcast by the playback engine for presentation consumers
//! (highlighting, progress display, queue status). Serializable so a UI
//! bridge can forward them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// The chunk queue was attached to the audio engine for the first time
    /// in this generation job
    QueueAttached {
        chunk_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Playback was started after the initial attach
    PlaybackStarted {
        timestamp: DateTime<Utc>,
    },

    /// A newly ready chunk was appended to the live queue
    ChunkAppended {
        filename: String,
        source_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// The active (section, line) under the playback position changed
    ActiveLineChanged {
        section_index: u32,
        line_index: Option<usize>,
        timestamp: DateTime<Utc>,
    },

    /// Periodic position/duration update for progress display
    PlaybackProgress {
        position_ms: u64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Playing/paused transition reported by the audio engine
    PlaybackStateChanged {
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// Generation job advanced to a new stage
    JobStageChanged {
        stage: String,
        timestamp: DateTime<Utc>,
    },

    /// Generation job reported a terminal failure
    JobFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for player events
///
/// Send errors are ignored: no subscribers is a valid state.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event to all subscribers.
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
