//! Shared playback state
//!
//! Thread-safe shared state for coordination between the poll loop, the
//! chunk queue, the engine-event monitor, and presentation consumers.
//!
//! Transcript/chunk state lives in one immutable `EpisodeState` record
//! behind an `Arc`; each poll builds a fresh record and swaps it in one
//! write, so readers always observe a fully merged snapshot and never a
//! half-applied one.

use std::sync::Arc;

use tokio::sync::RwLock;
use topicast_common::events::{EventBus, PlayerEvent};
use topicast_common::job::{JobStatus, JobStatusResponse};
use topicast_common::transcript::Section;

use crate::playback::resolver::ActivePosition;

/// Immutable view of the generation job's transcript and chunk output
///
/// Swapped wholesale per poll cycle; never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct EpisodeState {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub stage: String,
    /// Sections ordered by ascending `section_index`
    pub sections: Vec<Section>,
    /// Ready chunk filenames, ordered by ascending section index
    pub ready_chunks: Vec<String>,
    /// Final mixed audio, once the backend reports it
    pub audio_url: Option<String>,
}

impl EpisodeState {
    pub fn empty(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    fn from_poll(job_id: &str, resp: &JobStatusResponse) -> Self {
        let mut sections = resp.sections().to_vec();
        sections.sort_by_key(|s| s.section_index);
        Self {
            job_id: job_id.to_string(),
            status: Some(resp.status),
            stage: resp.stage.clone(),
            sections,
            ready_chunks: resp.ready_chunks().to_vec(),
            audio_url: resp
                .result
                .as_ref()
                .filter(|r| !r.audio_url.is_empty())
                .map(|r| r.audio_url.clone()),
        }
    }

    pub fn section(&self, section_index: u32) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.section_index == section_index)
    }

    /// Total line count across all sections.
    pub fn total_lines(&self) -> usize {
        self.sections.iter().map(|s| s.lines.len()).sum()
    }
}

/// Latest values from the audio engine's event streams
///
/// Read-only to the resolver and seek planner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackSnapshot {
    /// Position local to the current source
    pub position_ms: u64,
    /// Total known duration of the attached content (0 until reported)
    pub duration_ms: u64,
    pub playing: bool,
    pub current_source_index: Option<usize>,
}

/// Shared state accessible by all components
pub struct SharedState {
    episode: RwLock<Arc<EpisodeState>>,
    playback: RwLock<PlaybackSnapshot>,
    active: RwLock<Option<ActivePosition>>,
    events: EventBus,
}

impl SharedState {
    pub fn new(events: EventBus) -> Self {
        Self {
            episode: RwLock::new(Arc::new(EpisodeState::default())),
            playback: RwLock::new(PlaybackSnapshot::default()),
            active: RwLock::new(None),
            events,
        }
    }

    /// Current episode snapshot (cheap Arc clone).
    pub async fn episode(&self) -> Arc<EpisodeState> {
        self.episode.read().await.clone()
    }

    /// Merge a poll response by swapping in a freshly built snapshot.
    ///
    /// Returns the previous snapshot so the caller can detect transitions
    /// (stage changes, terminal status).
    pub async fn apply_poll(
        &self,
        job_id: &str,
        resp: &JobStatusResponse,
    ) -> Arc<EpisodeState> {
        let next = Arc::new(EpisodeState::from_poll(job_id, resp));
        let mut episode = self.episode.write().await;
        std::mem::replace(&mut *episode, next)
    }

    /// Reset transcript state for a new generation job.
    pub async fn reset_episode(&self, job_id: &str) {
        *self.episode.write().await = Arc::new(EpisodeState::empty(job_id));
        *self.active.write().await = None;
    }

    pub async fn playback(&self) -> PlaybackSnapshot {
        *self.playback.read().await
    }

    /// Apply one engine event's worth of change to the playback snapshot.
    pub async fn update_playback<F>(&self, apply: F) -> PlaybackSnapshot
    where
        F: FnOnce(&mut PlaybackSnapshot),
    {
        let mut playback = self.playback.write().await;
        apply(&mut playback);
        *playback
    }

    pub async fn active(&self) -> Option<ActivePosition> {
        *self.active.read().await
    }

    /// Store the newly resolved active position; true if it changed.
    pub async fn swap_active(&self, next: Option<ActivePosition>) -> bool {
        let mut active = self.active.write().await;
        if *active == next {
            false
        } else {
            *active = next;
            true
        }
    }

    /// Broadcast an event to all subscribers.
    pub fn emit(&self, event: PlayerEvent) {
        self.events.emit(event);
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
