//! Shared test helpers
//!
//! A recording audio engine that captures every command and can be told to
//! reject seeks, plus small transcript builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use topicast_common::transcript::{Line, Section, SectionStatus};
use topicast_player::engine::{AudioEngine, EngineError, EngineEvent};

/// One recorded engine command
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetSingleSource(String),
    SetQueueSources(Vec<String>),
    AppendToQueue(String),
    Seek {
        offset_ms: u64,
        source_index: Option<usize>,
    },
    Play,
    Pause,
    SetSpeed(f64),
}

/// Engine double that records commands and emits scripted events
pub struct RecordingEngine {
    commands: Mutex<Vec<EngineCommand>>,
    reject_source_seeks: Mutex<bool>,
    reject_all_seeks: Mutex<bool>,
    tx: broadcast::Sender<EngineEvent>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(64);
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            reject_source_seeks: Mutex::new(false),
            reject_all_seeks: Mutex::new(false),
            tx,
        })
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<(u64, Option<usize>)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                EngineCommand::Seek {
                    offset_ms,
                    source_index,
                } => Some((offset_ms, source_index)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&EngineCommand) -> bool) -> usize {
        self.commands().iter().filter(|c| matches(c)).count()
    }

    pub fn reject_source_seeks(&self, reject: bool) {
        *self.reject_source_seeks.lock().unwrap() = reject;
    }

    pub fn reject_all_seeks(&self, reject: bool) {
        *self.reject_all_seeks.lock().unwrap() = reject;
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    fn record(&self, command: EngineCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

impl AudioEngine for RecordingEngine {
    fn set_single_source(&self, url: &str) -> Result<(), EngineError> {
        self.record(EngineCommand::SetSingleSource(url.to_string()));
        Ok(())
    }

    fn set_queue_sources(&self, urls: Vec<String>) -> Result<(), EngineError> {
        self.record(EngineCommand::SetQueueSources(urls));
        Ok(())
    }

    fn append_to_queue(&self, url: &str) -> Result<(), EngineError> {
        self.record(EngineCommand::AppendToQueue(url.to_string()));
        Ok(())
    }

    fn seek(&self, offset_ms: u64, source_index: Option<usize>) -> Result<(), EngineError> {
        if *self.reject_all_seeks.lock().unwrap() {
            return Err(EngineError::Rejected("scripted rejection".to_string()));
        }
        if source_index.is_some() && *self.reject_source_seeks.lock().unwrap() {
            return Err(EngineError::InvalidSourceIndex(source_index.unwrap()));
        }
        self.record(EngineCommand::Seek {
            offset_ms,
            source_index,
        });
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        self.record(EngineCommand::Play);
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCommand::Pause);
        Ok(())
    }

    fn set_speed(&self, factor: f64) -> Result<(), EngineError> {
        self.record(EngineCommand::SetSpeed(factor));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

/// Section builder with sane defaults
pub fn section(index: u32, status: SectionStatus, lines: Vec<Line>) -> Section {
    Section {
        section_index: index,
        title: format!("Section {}", index),
        status,
        lines,
        ..Default::default()
    }
}

/// Untimed line
pub fn line(text: &str) -> Line {
    Line {
        speaker: "Host".to_string(),
        text: text.to_string(),
        ..Default::default()
    }
}

/// Line with section-relative timing
pub fn timed_line(text: &str, start_ms: u64, end_ms: u64) -> Line {
    Line {
        start_ms: Some(start_ms),
        end_ms: Some(end_ms),
        ..line(text)
    }
}

/// Line with absolute timing
pub fn global_line(text: &str, start_ms: u64, end_ms: u64) -> Line {
    Line {
        global_start_ms: Some(start_ms),
        global_end_ms: Some(end_ms),
        ..line(text)
    }
}
