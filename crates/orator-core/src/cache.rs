use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OratorError, Result};
use crate::store::StateStore;
use crate::types::{AnalysisResult, MediaDigest};

pub const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:8000";

/// One cached analysis, keyed by the content digest of the file that
/// produced it. Created on first successful analysis, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: MediaDigest,
    pub data: AnalysisResult,
}

/// The entire persisted state: every cached inference plus the analysis
/// server address, serialized as one JSON document.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    inferences: Vec<CacheEntry>,
    #[serde(rename = "serverAddress", default = "default_server_address")]
    server_address: String,
}

fn default_server_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            inferences: Vec::new(),
            server_address: default_server_address(),
        }
    }
}

/// Content-addressed cache of analysis results.
///
/// The backing store holds a single document that is reloaded whole at
/// startup and rewritten whole on every mutation. Writes are never
/// concurrent in this model; a multi-process deployment would need a real
/// transactional store. There is no eviction and no TTL.
pub struct InferenceCache {
    doc: StateDocument,
    store: Box<dyn StateStore>,
}

impl std::fmt::Debug for InferenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceCache")
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

impl InferenceCache {
    /// Load the persisted document, or start empty if none exists yet.
    /// A present-but-corrupt document is a hard error rather than a silent
    /// reset.
    pub fn load(store: Box<dyn StateStore>) -> Result<Self> {
        let doc = match store.read()? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => StateDocument::default(),
        };

        let cache = Self { doc, store };
        debug!(entries = cache.len(), "loaded inference cache");
        Ok(cache)
    }

    pub fn has(&self, digest: &MediaDigest) -> bool {
        self.doc.inferences.iter().any(|entry| &entry.id == digest)
    }

    /// Cache miss is a normal branch for callers, surfaced as `NotFound`.
    pub fn get(&self, digest: &MediaDigest) -> Result<&AnalysisResult> {
        self.doc
            .inferences
            .iter()
            .find(|entry| &entry.id == digest)
            .map(|entry| &entry.data)
            .ok_or_else(|| OratorError::NotFound {
                digest: digest.clone(),
            })
    }

    /// Insert or overwrite an entry, then rewrite the whole document.
    /// After this returns Ok, a fresh `load` over the same store observes
    /// the entry.
    pub fn put(&mut self, digest: MediaDigest, result: AnalysisResult) -> Result<()> {
        match self
            .doc
            .inferences
            .iter_mut()
            .find(|entry| entry.id == digest)
        {
            Some(entry) => entry.data = result,
            None => self.doc.inferences.push(CacheEntry {
                id: digest.clone(),
                data: result,
            }),
        }

        debug!(%digest, entries = self.len(), "stored analysis");
        self.persist()
    }

    /// All entries in insertion order (oldest first).
    pub fn entries(&self) -> &[CacheEntry] {
        &self.doc.inferences
    }

    /// Look an entry up by digest prefix, for terminal-friendly addressing.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&CacheEntry> {
        self.doc
            .inferences
            .iter()
            .find(|entry| entry.id.as_str().starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.doc.inferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.inferences.is_empty()
    }

    pub fn server_address(&self) -> &str {
        &self.doc.server_address
    }

    /// Update the analysis server address; rides in the same document.
    pub fn set_server_address(&mut self, address: &str) -> Result<()> {
        if self.doc.server_address == address {
            return Ok(());
        }
        self.doc.server_address = address.to_string();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.doc)?;
        self.store.write(&bytes)
    }
}
