//! Playback synchronization engine
//!
//! The pieces between polled transcript state and the audio engine: the
//! section↔source map, position→line resolution, incremental chunk
//! queueing, seek planning, and the engine-event monitor.

pub mod chunk_queue;
pub mod monitor;
pub mod resolver;
pub mod seek;
pub mod source_map;

pub use chunk_queue::ChunkQueueManager;
pub use resolver::{resolve, ActivePosition};
pub use seek::SeekPlanner;
pub use source_map::SectionSourceMap;
