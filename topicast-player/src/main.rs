//! Topicast Player - Main entry point
//!
//! Headless progressive player for generated episodes: creates or attaches
//! to a generation job, polls its transcript/chunk state, and plays the
//! ready chunks through the simulated engine while logging the currently
//! spoken line. The engine seam is where a platform playback backend plugs
//! in; everything above it is the real synchronization engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topicast_common::events::{EventBus, PlayerEvent};
use topicast_common::job::JobCreateRequest;
use topicast_player::config::Config;
use topicast_player::engine::simulated::SimulatedEngine;
use topicast_player::engine::{AudioEngine, BaseUrlResolver, UrlResolver};
use topicast_player::job::{JobClient, JobPoller};
use topicast_player::playback::chunk_queue::ChunkQueueManager;
use topicast_player::playback::monitor::start_monitor;
use topicast_player::playback::source_map::SectionSourceMap;
use topicast_player::state::SharedState;

/// Command-line arguments for topicast-player
#[derive(Parser, Debug)]
#[command(name = "topicast-player")]
#[command(about = "Progressive episode player for Topicast")]
#[command(version)]
struct Args {
    /// Generation backend base URL
    #[arg(short, long, env = "TOPICAST_BASE_URL")]
    base_url: Option<String>,

    /// Existing generation job to attach to
    #[arg(short, long, env = "TOPICAST_JOB_ID", conflicts_with = "topic")]
    job_id: Option<String>,

    /// Topic to create a new generation job for
    #[arg(short, long)]
    topic: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "TOPICAST_CONFIG")]
    config: Option<PathBuf>,

    /// Playback speed factor
    #[arg(long)]
    speed: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topicast_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(speed) = args.speed {
        config.playback_speed = Some(speed);
    }

    info!("Starting Topicast player against {}", config.base_url);

    // Wire the engine, shared state, and playback components
    let engine = Arc::new(SimulatedEngine::new());
    let engine_dyn: Arc<dyn AudioEngine> = engine.clone();
    let urls: Arc<dyn UrlResolver> = Arc::new(BaseUrlResolver::new(config.base_url.clone()));

    let events = EventBus::default();
    let state = Arc::new(SharedState::new(events.clone()));
    let chunk_queue = Arc::new(ChunkQueueManager::new(
        engine_dyn.clone(),
        urls.clone(),
        state.clone(),
        config.playback_speed,
    ));

    let _monitor = start_monitor(
        engine_dyn.clone(),
        state.clone(),
        chunk_queue.clone(),
        config.estimator,
    );

    // Resolve the job to follow
    let client = JobClient::new(config.base_url.clone());
    let job_id = match (args.job_id, args.topic) {
        (Some(job_id), _) => job_id,
        (None, Some(topic)) => {
            info!("Creating generation job for topic: {}", topic);
            client
                .create_job(&JobCreateRequest::new(topic))
                .await
                .context("Failed to create generation job")?
                .job_id
        }
        (None, None) => anyhow::bail!("either --job-id or --topic is required"),
    };
    info!("Following job {}", job_id);

    // Dry-run clock: advance the simulated engine and feed it measured
    // chunk durations as sections report them, so the playhead crosses
    // source boundaries the way a real engine would.
    let clock_engine = engine.clone();
    let clock_state = state.clone();
    let clock_queue = chunk_queue.clone();
    let _clock = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        loop {
            ticker.tick().await;
            let episode = clock_state.episode().await;
            let map =
                SectionSourceMap::build(&episode.sections, clock_queue.enqueued_len().await);
            for section in &episode.sections {
                if let (true, Some(audio_ms)) = (section.is_ready(), section.audio_ms) {
                    if let Some(source_index) = map.source_for_section(section.section_index) {
                        clock_engine.set_source_duration(source_index, audio_ms);
                    }
                }
            }
            clock_engine.advance(250);
        }
    });

    let poller = JobPoller::new(
        client,
        state.clone(),
        chunk_queue.clone(),
        engine_dyn.clone(),
        urls.clone(),
        config.poll_interval(),
    );
    let _poller = tokio::spawn(poller.run(job_id));

    // Render player events until shutdown
    let mut player_events = BroadcastStream::new(events.subscribe());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            next = player_events.next() => match next {
                Some(Ok(event)) => render_event(event, &state).await,
                Some(Err(_)) => continue, // lagged; keep rendering
                None => break,
            }
        }
    }

    Ok(())
}

/// Log player events in a form readable as a transcript.
async fn render_event(event: PlayerEvent, state: &SharedState) {
    match event {
        PlayerEvent::ActiveLineChanged {
            section_index,
            line_index,
            ..
        } => {
            let episode = state.episode().await;
            if let Some(section) = episode.section(section_index) {
                match line_index.and_then(|i| section.lines.get(i)) {
                    Some(line) => info!("[{}] {}: {}", section.title, line.speaker, line.text),
                    None => info!("[{}]", section.title),
                }
            }
        }
        PlayerEvent::QueueAttached { chunk_count, .. } => {
            info!("Audio queue attached with {} chunk(s)", chunk_count);
        }
        PlayerEvent::ChunkAppended {
            filename,
            source_index,
            ..
        } => {
            info!("Chunk {} appended at source index {}", filename, source_index);
        }
        PlayerEvent::PlaybackStarted { .. } => info!("Playback started"),
        PlayerEvent::PlaybackStateChanged { playing, .. } => {
            info!("Playback {}", if playing { "resumed" } else { "paused" });
        }
        PlayerEvent::PlaybackProgress {
            position_ms,
            duration_ms,
            ..
        } => debug!("Progress: {}ms / {}ms", position_ms, duration_ms),
        PlayerEvent::JobStageChanged { stage, .. } => info!("Generation stage: {}", stage),
        PlayerEvent::JobFailed { error, .. } => warn!("Generation failed: {}", error),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
