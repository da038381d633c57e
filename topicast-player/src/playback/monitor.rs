//! Engine-event monitoring task
//!
//! Consumes the audio engine's event stream, keeps the playback snapshot
//! current, and re-derives the active (section, line) after every event.
//! Engine events never mutate transcript or chunk state; they only refresh
//! the snapshot and trigger re-resolution.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use topicast_common::events::PlayerEvent;
use topicast_common::timing::EstimatorPolicy;

use crate::engine::{AudioEngine, EngineEvent};
use crate::playback::chunk_queue::ChunkQueueManager;
use crate::playback::resolver;
use crate::playback::source_map::SectionSourceMap;
use crate::state::SharedState;

/// Start the background monitoring task
pub fn start_monitor(
    engine: Arc<dyn AudioEngine>,
    state: Arc<SharedState>,
    chunk_queue: Arc<ChunkQueueManager>,
    policy: EstimatorPolicy,
) -> JoinHandle<()> {
    tokio::spawn(monitor_task(engine, state, chunk_queue, policy))
}

async fn monitor_task(
    engine: Arc<dyn AudioEngine>,
    state: Arc<SharedState>,
    chunk_queue: Arc<ChunkQueueManager>,
    policy: EstimatorPolicy,
) {
    let mut rx = engine.subscribe();
    info!("Engine monitor task started");

    loop {
        match rx.recv().await {
            Ok(event) => handle_event(event, &state, &chunk_queue, &policy).await,
            Err(RecvError::Lagged(skipped)) => {
                // Position events are high-rate and self-correcting; the
                // next one restores an accurate snapshot.
                warn!("Engine event stream lagged, skipped {} event(s)", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Engine event stream closed, monitor stopping");
                break;
            }
        }
    }
}

async fn handle_event(
    event: EngineEvent,
    state: &Arc<SharedState>,
    chunk_queue: &Arc<ChunkQueueManager>,
    policy: &EstimatorPolicy,
) {
    let playback = state
        .update_playback(|pb| match event {
            EngineEvent::Position { position_ms } => pb.position_ms = position_ms,
            EngineEvent::Duration { duration_ms } => pb.duration_ms = duration_ms,
            EngineEvent::PlayState { playing } => pb.playing = playing,
            EngineEvent::CurrentSourceIndex { source_index } => {
                pb.current_source_index = source_index
            }
        })
        .await;

    match event {
        EngineEvent::Position { .. } => {
            state.emit(PlayerEvent::PlaybackProgress {
                position_ms: playback.position_ms,
                duration_ms: playback.duration_ms,
                timestamp: Utc::now(),
            });
        }
        EngineEvent::PlayState { playing } => {
            state.emit(PlayerEvent::PlaybackStateChanged {
                playing,
                timestamp: Utc::now(),
            });
        }
        _ => {}
    }

    // Re-derive the active line against the freshest snapshots.
    let episode = state.episode().await;
    let source_map = SectionSourceMap::build(&episode.sections, chunk_queue.enqueued_len().await);
    let active = resolver::resolve(&playback, &episode.sections, &source_map, policy);

    if state.swap_active(active).await {
        if let Some(active) = active {
            debug!(
                "Active position changed: section {} line {:?}",
                active.section_index, active.line_index
            );
            state.emit(PlayerEvent::ActiveLineChanged {
                section_index: active.section_index,
                line_index: active.line_index,
                timestamp: Utc::now(),
            });
        }
    }
}
