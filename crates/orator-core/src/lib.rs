//! Orator Core Library
//!
//! Client-side core for video speech analysis: content digesting, a
//! persisted inference cache keyed by digest, the remote analysis client,
//! and playback synchronization for report frontends.

pub mod cache;
pub mod client;
pub mod digest;
pub mod error;
pub mod format;
pub mod playback;
pub mod progress;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{CacheEntry, DEFAULT_SERVER_ADDRESS, InferenceCache};
pub use client::{AnalysisBackend, AnalysisClient, HttpAnalysisBackend};
pub use digest::{CHUNK_SIZE, Md5Stream, digest_file};
pub use error::{OratorError, Result};
pub use format::{
    EventBucket, TimelineRow, format_report_readable, format_timestamp, group_events,
    render_timeline,
};
pub use playback::{MarkerSpan, PlaybackState, PlaybackSync, PlayerHandle, marker_span};
pub use progress::ProgressTicker;
pub use session::{SelectedSession, SessionSelector};
pub use store::{FsStore, MemStore, StateStore};
pub use types::{AnalysisResult, DetectedEvent, MediaDigest, Sentence, Sentiment};
