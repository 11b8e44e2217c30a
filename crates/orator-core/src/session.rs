use std::path::{Path, PathBuf};

use crate::types::MediaDigest;

/// The video currently on display: its cache key plus a transient reference
/// to the local media. Never persisted; the cache entry outlives it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSession {
    pub digest: MediaDigest,
    pub media: PathBuf,
}

/// Tracks which cached analysis is "current", independent of whether its
/// media is still loaded anywhere.
#[derive(Debug, Default)]
pub struct SessionSelector {
    current: Option<SelectedSession>,
}

impl SessionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a session current; any previous selection is dropped.
    pub fn select(&mut self, digest: MediaDigest, media: impl Into<PathBuf>) {
        self.current = Some(SelectedSession {
            digest,
            media: media.into(),
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&SelectedSession> {
        self.current.as_ref()
    }

    pub fn digest(&self) -> Option<&MediaDigest> {
        self.current.as_ref().map(|session| &session.digest)
    }

    pub fn media(&self) -> Option<&Path> {
        self.current.as_ref().map(|session| session.media.as_path())
    }

    pub fn is_current(&self, digest: &MediaDigest) -> bool {
        self.digest() == Some(digest)
    }
}
