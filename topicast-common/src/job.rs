//! Generation job wire types
//!
//! Request/response bodies for the episode generation backend. During a run
//! the backend streams partial transcript/chunk state through `metrics`;
//! the authoritative copy moves to `result` at completion. Unknown fields
//! are tolerated everywhere so backend additions never break the player.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transcript::Section;

/// Job lifecycle as reported by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states stop the poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// POST /jobs request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreateRequest {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_speed: Option<f64>,
}

impl JobCreateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            tts_provider: None,
            tts_voice: None,
            tts_speed: None,
        }
    }
}

/// POST /jobs response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreateResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Final job result, present once the backend completes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobResult {
    #[serde(default)]
    pub episode_id: Option<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub preview_audio_url: Option<String>,
    #[serde(default)]
    pub script_lines: u64,
    #[serde(default)]
    pub transcript_sections: Vec<Section>,
    #[serde(default)]
    pub ready_audio_chunks: Vec<String>,
    /// Opaque agenda graph, passed through to presentation untouched
    #[serde(default)]
    pub agenda_nodes: Vec<serde_json::Value>,
    #[serde(default)]
    pub agenda_edges: Vec<serde_json::Value>,
    #[serde(default)]
    pub playable_from_chunks: bool,
    #[serde(default = "default_true")]
    pub final_audio_ready: bool,
    #[serde(default = "default_true")]
    pub timings_ready: bool,
}

/// Mid-run progress payload, mirrored into `metrics` on every stage change
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobMetrics {
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub ready_audio_chunks: Vec<String>,
    #[serde(default)]
    pub transcript_sections: Vec<Section>,
}

/// GET /jobs/{id} response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub metrics: JobMetrics,
}

impl JobStatusResponse {
    /// Latest transcript sections, preferring the final result over mid-run
    /// metrics.
    pub fn sections(&self) -> &[Section] {
        if let Some(result) = &self.result {
            if !result.transcript_sections.is_empty() {
                return &result.transcript_sections;
            }
        }
        &self.metrics.transcript_sections
    }

    /// Latest ready-chunk filename list, ordered by ascending section index.
    pub fn ready_chunks(&self) -> &[String] {
        if let Some(result) = &self.result {
            if !result.ready_audio_chunks.is_empty() {
                return &result.ready_audio_chunks;
            }
        }
        &self.metrics.ready_audio_chunks
    }
}
