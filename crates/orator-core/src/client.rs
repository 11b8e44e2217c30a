use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::cache::InferenceCache;
use crate::digest::digest_file;
use crate::error::{OratorError, Result};
use crate::types::{AnalysisResult, MediaDigest};

/// Remote analysis collaborator. One call per upload; the server owns the
/// whole pipeline (transcription, scoring, event detection).
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, file_name: &str, video: Vec<u8>) -> Result<AnalysisResult>;
}

/// HTTP backend: `POST {server}/analyze_video`, multipart body with a
/// single `video` field carrying the raw file.
pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn video_mime(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze(&self, file_name: &str, video: Vec<u8>) -> Result<AnalysisResult> {
        let url = format!("{}/analyze_video", self.base_url);

        let part = Part::bytes(video)
            .file_name(file_name.to_string())
            .mime_str(video_mime(file_name))?;
        let form = Form::new().part("video", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "analysis server rejected upload");
            return Err(OratorError::Analysis {
                reason: format!("server returned {status}: {body}"),
            });
        }

        let result = response.json::<AnalysisResult>().await?;
        Ok(result)
    }
}

/// Write-through, content-addressed memoization over the remote analysis.
///
/// Every call digests the file, serves a known digest from cache, and only
/// uploads on a miss. Caching assumes the server is deterministic per byte
/// content; `force` is the escape hatch when it is not.
pub struct AnalysisClient {
    backend: Box<dyn AnalysisBackend>,
    cache: InferenceCache,
}

impl AnalysisClient {
    pub fn new(backend: Box<dyn AnalysisBackend>, cache: InferenceCache) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &InferenceCache {
        &self.cache
    }

    /// Analyze a video file, served from cache when its content is known.
    ///
    /// Calls are single-flight for themselves only: two concurrent uploads
    /// of the same bytes are not coalesced, and the later `put` wins.
    pub async fn analyze(&mut self, path: &Path, force: bool) -> Result<AnalysisResult> {
        let digest = digest_file(path).await?;
        self.analyze_with_digest(digest, path, force).await
    }

    /// Same as [`analyze`](Self::analyze) for callers that already hold the
    /// digest (e.g. a frontend that displayed it while hashing).
    pub async fn analyze_with_digest(
        &mut self,
        digest: MediaDigest,
        path: &Path,
        force: bool,
    ) -> Result<AnalysisResult> {
        if !force && self.cache.has(&digest) {
            debug!(%digest, "serving analysis from cache");
            return self.cache.get(&digest).cloned();
        }

        let video = tokio::fs::read(path)
            .await
            .map_err(|source| OratorError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        info!(%digest, bytes = video.len(), "uploading video for analysis");
        let result = self.backend.analyze(&file_name, video).await?;

        // Failures above leave the cache exactly as it was; only a
        // successful response is committed.
        self.cache.put(digest, result.clone())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::MemStore;

    struct ScriptedBackend {
        calls: Arc<AtomicUsize>,
        response: std::result::Result<AnalysisResult, String>,
    }

    #[async_trait]
    impl AnalysisBackend for ScriptedBackend {
        async fn analyze(&self, _file_name: &str, _video: Vec<u8>) -> Result<AnalysisResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(result) => Ok(result.clone()),
                Err(reason) => Err(OratorError::Analysis {
                    reason: reason.clone(),
                }),
            }
        }
    }

    fn sample_result(score: f64) -> AnalysisResult {
        serde_json::from_value(serde_json::json!({ "score": score })).unwrap()
    }

    fn client_with(
        response: std::result::Result<AnalysisResult, String>,
    ) -> (AnalysisClient, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            calls: Arc::clone(&calls),
            response,
        };
        let cache = InferenceCache::load(Box::new(MemStore::new())).unwrap();
        (AnalysisClient::new(Box::new(backend), cache), calls)
    }

    fn temp_video(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn second_analyze_of_same_content_skips_the_backend() {
        let (mut client, calls) = client_with(Ok(sample_result(75.0)));
        let (_dir, path) = temp_video(b"same bytes");

        let first = client.analyze(&path, false).await.unwrap();
        let second = client.analyze(&path, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn renamed_copy_hits_the_same_cache_entry() {
        let (mut client, calls) = client_with(Ok(sample_result(60.0)));
        let (dir, path) = temp_video(b"identical content");

        let copy = dir.path().join("take-two.webm");
        std::fs::write(&copy, b"identical content").unwrap();

        client.analyze(&path, false).await.unwrap();
        client.analyze(&copy, false).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache().len(), 1);
    }

    #[tokio::test]
    async fn force_reuploads_and_overwrites_the_entry() {
        let (mut client, calls) = client_with(Ok(sample_result(88.0)));
        let (_dir, path) = temp_video(b"bytes");

        client.analyze(&path, false).await.unwrap();
        client.analyze(&path, true).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.cache().len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_leaves_cache_untouched() {
        let (mut client, calls) = client_with(Err("connection refused".to_string()));
        let (_dir, path) = temp_video(b"doomed upload");

        let digest = digest_file(&path).await.unwrap();
        let err = client.analyze(&path, false).await.unwrap_err();

        assert!(matches!(err, OratorError::Analysis { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!client.cache().has(&digest));
    }

    #[test]
    fn mime_guess_covers_common_containers() {
        assert_eq!(video_mime("talk.mp4"), "video/mp4");
        assert_eq!(video_mime("talk.WEBM"), "video/webm");
        assert_eq!(video_mime("talk.mov"), "video/quicktime");
        assert_eq!(video_mime("talk"), "application/octet-stream");
    }
}
