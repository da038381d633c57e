//! Deterministic in-process audio engine
//!
//! Stands in for a platform playback engine: holds the attached source
//! list, advances a clock only when told to, and emits the same event kinds
//! a real engine would. The binary drives it as a headless dry-run player;
//! integration tests script it tick by tick.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use super::{AudioEngine, EngineEvent, EngineError};

#[derive(Debug, Default)]
struct Inner {
    sources: Vec<String>,
    /// Known duration per source; None until registered
    durations: Vec<Option<u64>>,
    current: Option<usize>,
    /// Position local to the current source
    position_ms: u64,
    playing: bool,
    speed: f64,
}

impl Inner {
    fn total_known_duration(&self) -> u64 {
        self.durations.iter().flatten().sum()
    }
}

/// Clock-driven engine with a scriptable timeline
pub struct SimulatedEngine {
    inner: Mutex<Inner>,
    tx: broadcast::Sender<EngineEvent>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            inner: Mutex::new(Inner {
                speed: 1.0,
                ..Default::default()
            }),
            tx,
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    /// Register the real duration of a queued source once it is known.
    ///
    /// The dry-run driver feeds these from section `audio_ms` values so the
    /// clock can cross source boundaries.
    pub fn set_source_duration(&self, source_index: usize, duration_ms: u64) {
        let total = {
            let mut inner = self.inner.lock().unwrap();
            if source_index >= inner.durations.len()
                || inner.durations[source_index] == Some(duration_ms)
            {
                return;
            }
            inner.durations[source_index] = Some(duration_ms);
            inner.total_known_duration()
        };
        self.emit(EngineEvent::Duration { duration_ms: total });
    }

    /// Advance the playback clock by `delta_ms` of wall time.
    ///
    /// Crosses into the next source when the current one has a known
    /// duration and the clock passes it; pauses at the end of the last
    /// timed source.
    pub fn advance(&self, delta_ms: u64) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.playing || inner.current.is_none() {
                return;
            }
            inner.position_ms += (delta_ms as f64 * inner.speed).round() as u64;

            while let Some(index) = inner.current {
                let Some(duration) = inner.durations.get(index).copied().flatten() else {
                    break;
                };
                if inner.position_ms < duration {
                    break;
                }
                if index + 1 < inner.sources.len() {
                    inner.position_ms -= duration;
                    inner.current = Some(index + 1);
                    events.push(EngineEvent::CurrentSourceIndex {
                        source_index: inner.current,
                    });
                } else {
                    inner.position_ms = duration;
                    inner.playing = false;
                    events.push(EngineEvent::PlayState { playing: false });
                    break;
                }
            }
            events.push(EngineEvent::Position {
                position_ms: inner.position_ms,
            });
        }
        for event in events {
            self.emit(event);
        }
    }

    /// Snapshot of (current source index, local position) for assertions.
    pub fn playhead(&self) -> (Option<usize>, u64) {
        let inner = self.inner.lock().unwrap();
        (inner.current, inner.position_ms)
    }

    /// Currently attached source URLs.
    pub fn sources(&self) -> Vec<String> {
        self.inner.lock().unwrap().sources.clone()
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for SimulatedEngine {
    fn set_single_source(&self, url: &str) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.sources = vec![url.to_string()];
            inner.durations = vec![None];
            inner.current = Some(0);
            inner.position_ms = 0;
        }
        debug!("Single source attached: {}", url);
        self.emit(EngineEvent::CurrentSourceIndex {
            source_index: Some(0),
        });
        self.emit(EngineEvent::Position { position_ms: 0 });
        Ok(())
    }

    fn set_queue_sources(&self, urls: Vec<String>) -> Result<(), EngineError> {
        let current = {
            let mut inner = self.inner.lock().unwrap();
            inner.durations = vec![None; urls.len()];
            inner.current = if urls.is_empty() { None } else { Some(0) };
            inner.position_ms = 0;
            inner.sources = urls;
            inner.current
        };
        debug!("Queue attached with {:?} as current source", current);
        self.emit(EngineEvent::CurrentSourceIndex {
            source_index: current,
        });
        self.emit(EngineEvent::Position { position_ms: 0 });
        Ok(())
    }

    fn append_to_queue(&self, url: &str) -> Result<(), EngineError> {
        let became_current = {
            let mut inner = self.inner.lock().unwrap();
            inner.sources.push(url.to_string());
            inner.durations.push(None);
            if inner.current.is_none() {
                inner.current = Some(inner.sources.len() - 1);
                true
            } else {
                false
            }
        };
        if became_current {
            self.emit(EngineEvent::CurrentSourceIndex {
                source_index: self.inner.lock().unwrap().current,
            });
        }
        Ok(())
    }

    fn seek(&self, offset_ms: u64, source_index: Option<usize>) -> Result<(), EngineError> {
        let (index_changed, current) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.sources.is_empty() {
                return Err(EngineError::NoSource);
            }
            match source_index {
                Some(index) => {
                    if index >= inner.sources.len() {
                        return Err(EngineError::InvalidSourceIndex(index));
                    }
                    let changed = inner.current != Some(index);
                    inner.current = Some(index);
                    inner.position_ms = offset_ms;
                    (changed, inner.current)
                }
                None => {
                    inner.position_ms = offset_ms;
                    (false, inner.current)
                }
            }
        };
        if index_changed {
            self.emit(EngineEvent::CurrentSourceIndex {
                source_index: current,
            });
        }
        self.emit(EngineEvent::Position {
            position_ms: offset_ms,
        });
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.sources.is_empty() {
                return Err(EngineError::NoSource);
            }
            inner.playing = true;
        }
        self.emit(EngineEvent::PlayState { playing: true });
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.inner.lock().unwrap().playing = false;
        self.emit(EngineEvent::PlayState { playing: false });
        Ok(())
    }

    fn set_speed(&self, factor: f64) -> Result<(), EngineError> {
        if factor <= 0.0 {
            return Err(EngineError::Rejected(format!(
                "non-positive speed factor: {}",
                factor
            )));
        }
        self.inner.lock().unwrap().speed = factor;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}
