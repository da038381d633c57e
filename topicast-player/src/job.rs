//! Generation job client and poll loop
//!
//! One fixed-interval loop is the single writer of transcript/chunk state:
//! it fetches job status, swaps the merged snapshot in atomically, feeds
//! new chunks to the queue manager, and stops once the backend reports a
//! terminal status. Transport failures keep the last snapshot and retry on
//! the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use topicast_common::events::PlayerEvent;
use topicast_common::job::{JobCreateRequest, JobCreateResponse, JobStatus, JobStatusResponse};

use crate::engine::{AudioEngine, UrlResolver};
use crate::error::Result;
use crate::playback::chunk_queue::ChunkQueueManager;
use crate::state::SharedState;

/// HTTP client for the generation backend
#[derive(Debug, Clone)]
pub struct JobClient {
    http: reqwest::Client,
    base_url: String,
}

impl JobClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a generation job for a topic.
    pub async fn create_job(&self, request: &JobCreateRequest) -> Result<JobCreateResponse> {
        let url = format!("{}/jobs/create", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch the current status of a job.
    pub async fn get_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Fixed-interval job status poller
pub struct JobPoller {
    client: JobClient,
    state: Arc<SharedState>,
    chunk_queue: Arc<ChunkQueueManager>,
    engine: Arc<dyn AudioEngine>,
    urls: Arc<dyn UrlResolver>,
    interval: Duration,
}

impl JobPoller {
    pub fn new(
        client: JobClient,
        state: Arc<SharedState>,
        chunk_queue: Arc<ChunkQueueManager>,
        engine: Arc<dyn AudioEngine>,
        urls: Arc<dyn UrlResolver>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            state,
            chunk_queue,
            engine,
            urls,
            interval,
        }
    }

    /// Poll `job_id` until it reaches a terminal status.
    pub async fn run(self, job_id: String) {
        self.state.reset_episode(&job_id).await;
        self.chunk_queue.reset(&job_id).await;

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Polling job {} every {}ms",
            job_id,
            self.interval.as_millis()
        );

        loop {
            ticker.tick().await;

            let response = match self.client.get_status(&job_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Poll failed, retaining last snapshot: {}", e);
                    continue;
                }
            };

            let previous = self.state.apply_poll(&job_id, &response).await;
            if previous.stage != response.stage {
                debug!("Job stage: {} -> {}", previous.stage, response.stage);
                self.state.emit(PlayerEvent::JobStageChanged {
                    stage: response.stage.clone(),
                    timestamp: Utc::now(),
                });
            }

            self.chunk_queue
                .enqueue_ready(&job_id, response.ready_chunks())
                .await;

            if response.status.is_terminal() {
                self.finish(&job_id, &response).await;
                break;
            }
        }
    }

    async fn finish(&self, job_id: &str, response: &JobStatusResponse) {
        match response.status {
            JobStatus::Failed => {
                let error = response
                    .error
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_string());
                warn!("Job {} failed: {}", job_id, error);
                self.state.emit(PlayerEvent::JobFailed {
                    error,
                    timestamp: Utc::now(),
                });
            }
            JobStatus::Completed => {
                // Episodes that never produced playable chunks still have a
                // final mixed file; fall back to single-source playback.
                if self.chunk_queue.enqueued_len().await == 0 {
                    self.play_final_audio(response);
                }
            }
            _ => {}
        }
        info!(
            "Job {} reached terminal status {}, polling stopped",
            job_id, response.status
        );
    }

    fn play_final_audio(&self, response: &JobStatusResponse) {
        let Some(result) = response.result.as_ref() else {
            return;
        };
        if result.audio_url.is_empty() || !result.final_audio_ready {
            return;
        }
        let url = self.urls.resolve(&result.audio_url);
        info!("No chunks were queued, playing final audio {}", url);
        if let Err(e) = self.engine.set_single_source(&url) {
            warn!("Final audio attach rejected by engine: {}", e);
            return;
        }
        if let Err(e) = self.engine.play() {
            warn!("Final audio playback rejected by engine: {}", e);
        }
    }
}
