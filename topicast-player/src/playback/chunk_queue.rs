//! Progressive chunk queue
//!
//! Builds the audio engine's source list incrementally as synthesized
//! chunks become ready. Owns the "already queued" set and the attach-once
//! semantics: the first chunks of a job attach the queue and start
//! playback, later chunks append to the live playlist without reattaching.
//!
//! Every call is guarded by the active job id: chunk payloads from a
//! superseded job can arrive late through the async poll pipeline and must
//! be dropped, not queued.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use topicast_common::events::PlayerEvent;

use crate::engine::{AudioEngine, UrlResolver};
use crate::state::SharedState;

#[derive(Debug, Default)]
struct QueueInner {
    active_job: Option<String>,
    /// Filenames in enqueue order; once here, never removed or re-enqueued
    enqueued_order: Vec<String>,
    enqueued: HashSet<String>,
    attached: bool,
}

/// Incremental audio queue builder
pub struct ChunkQueueManager {
    engine: Arc<dyn AudioEngine>,
    urls: Arc<dyn UrlResolver>,
    state: Arc<SharedState>,
    /// Playback speed applied when the queue is first attached
    speed: Option<f64>,
    inner: Mutex<QueueInner>,
}

impl ChunkQueueManager {
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        urls: Arc<dyn UrlResolver>,
        state: Arc<SharedState>,
        speed: Option<f64>,
    ) -> Self {
        Self {
            engine,
            urls,
            state,
            speed,
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Start tracking a new generation job.
    ///
    /// Clears the enqueued set and detaches the previous queue; must run
    /// before any `enqueue_ready` for the new job is accepted. Chunk data
    /// still in flight for the previous job fails the job-id guard from
    /// here on.
    pub async fn reset(&self, job_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.active_job = Some(job_id.to_string());
        inner.enqueued_order.clear();
        inner.enqueued.clear();
        inner.attached = false;
        // No detach command in the engine contract: pause the old audio and
        // let the next attach replace the source list wholesale.
        if let Err(e) = self.engine.pause() {
            debug!("Pause on reset rejected: {}", e);
        }
        info!("Chunk queue reset for job {}", job_id);
    }

    /// Merge the latest ready-chunk list for `job_id`.
    ///
    /// Idempotent: the full list arrives on every poll and only the not-yet
    /// -enqueued suffix is appended, in the given order.
    pub async fn enqueue_ready(&self, job_id: &str, filenames: &[String]) {
        let mut inner = self.inner.lock().await;
        if inner.active_job.as_deref() != Some(job_id) {
            debug!(
                "Dropping {} chunk filename(s) for inactive job {}",
                filenames.len(),
                job_id
            );
            return;
        }

        let fresh: Vec<String> = filenames
            .iter()
            .filter(|f| !inner.enqueued.contains(*f))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return;
        }

        if !inner.attached {
            self.attach(&mut inner, fresh).await;
        } else {
            self.append(&mut inner, fresh).await;
        }
    }

    /// First chunks of the job: attach the queue and start playback.
    async fn attach(&self, inner: &mut QueueInner, fresh: Vec<String>) {
        let urls: Vec<String> = fresh.iter().map(|f| self.urls.resolve(f)).collect();
        if let Err(e) = self.engine.set_queue_sources(urls) {
            // Nothing marked enqueued: the next poll retries the full list.
            warn!("Queue attach rejected by engine: {}", e);
            return;
        }
        for filename in fresh {
            inner.enqueued.insert(filename.clone());
            inner.enqueued_order.push(filename);
        }
        inner.attached = true;

        if let Some(speed) = self.speed {
            if let Err(e) = self.engine.set_speed(speed) {
                warn!("Speed {} rejected by engine: {}", speed, e);
            }
        }

        self.state.emit(PlayerEvent::QueueAttached {
            chunk_count: inner.enqueued_order.len(),
            timestamp: Utc::now(),
        });

        match self.engine.play() {
            Ok(()) => {
                info!(
                    "Queue attached with {} chunk(s), playback started",
                    inner.enqueued_order.len()
                );
                self.state.emit(PlayerEvent::PlaybackStarted {
                    timestamp: Utc::now(),
                });
            }
            Err(e) => warn!("Playback start rejected by engine: {}", e),
        }
    }

    /// Later chunks: append to the live playlist, no reattachment.
    async fn append(&self, inner: &mut QueueInner, fresh: Vec<String>) {
        for filename in fresh {
            let url = self.urls.resolve(&filename);
            if let Err(e) = self.engine.append_to_queue(&url) {
                // Leave this and the rest un-marked; the next poll retries.
                warn!("Append of {} rejected by engine: {}", filename, e);
                break;
            }
            let source_index = inner.enqueued_order.len();
            inner.enqueued.insert(filename.clone());
            inner.enqueued_order.push(filename.clone());
            debug!("Appended chunk {} at source index {}", filename, source_index);
            self.state.emit(PlayerEvent::ChunkAppended {
                filename,
                source_index,
                timestamp: Utc::now(),
            });
        }

        // The engine stalls when it drains the queue before the next chunk
        // arrives; kick it again.
        if !self.state.playback().await.playing {
            if let Err(e) = self.engine.play() {
                warn!("Resume after append rejected by engine: {}", e);
            } else {
                info!("Playback resumed after appending chunk(s)");
            }
        }
    }

    /// Number of chunks enqueued for the active job.
    pub async fn enqueued_len(&self) -> usize {
        self.inner.lock().await.enqueued_order.len()
    }

    /// Whether a queue is currently attached to the engine.
    pub async fn is_attached(&self) -> bool {
        self.inner.lock().await.attached
    }

    pub async fn active_job(&self) -> Option<String> {
        self.inner.lock().await.active_job.clone()
    }
}
