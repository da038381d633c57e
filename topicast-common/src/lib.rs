//! # Topicast Common Library (topicast-common)
//!
//! Shared types for the Topicast progressive playback system.
//!
//! **Purpose:** Wire-level data model for generation jobs and transcripts,
//! the duration-estimation policy used when exact timing is absent, and the
//! player event bus shared between the engine and presentation consumers.

pub mod events;
pub mod job;
pub mod timing;
pub mod transcript;

pub use events::{EventBus, PlayerEvent};
pub use job::{JobStatus, JobStatusResponse};
pub use timing::EstimatorPolicy;
pub use transcript::{Line, Section, SectionStatus};
