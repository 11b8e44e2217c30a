use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;

/// Storage collaborator for the single persisted state document.
///
/// The cache treats this as an opaque byte slot: one document in, one
/// document out. Swapping in `MemStore` keeps everything above it testable
/// without touching the filesystem.
pub trait StateStore: Send + Sync {
    /// Returns the whole document, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replaces the whole document.
    fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// File-backed store, one JSON document per user.
pub struct FsStore {
    path: PathBuf,
}

impl FsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default state file location: `<cache dir>/orator/state.json`.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("orator")
            .join("state.json")
    }

    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FsStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a "process restart" in
/// tests is just a second cache loaded over a clone.
#[derive(Clone, Default)]
pub struct MemStore {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        let slot = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut slot = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(bytes.to_vec());
        Ok(())
    }
}
