use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::{OratorError, Result};
use crate::types::MediaDigest;

/// Files are hashed in 2 MiB chunks so a large video never has to sit in
/// memory whole.
pub const CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Incremental MD5 accumulator.
///
/// Chunks must be fed strictly in stream order; the final digest equals the
/// hash of the concatenated bytes, so chunk boundaries never affect it.
pub struct Md5Stream {
    ctx: md5::Context,
}

impl Default for Md5Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl Md5Stream {
    pub fn new() -> Self {
        Self {
            ctx: md5::Context::new(),
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.ctx.consume(chunk);
    }

    pub fn finalize(self) -> MediaDigest {
        MediaDigest::new(format!("{:x}", self.ctx.compute()))
    }
}

/// Compute the content digest of a file.
///
/// Reads `ceil(len / CHUNK_SIZE)` chunks sequentially; any failed read
/// aborts the whole attempt with `OratorError::Read` and no partial state
/// is reused.
pub async fn digest_file(path: &Path) -> Result<MediaDigest> {
    let read_err = |source| OratorError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).await.map_err(read_err)?;
    let len = file.metadata().await.map_err(read_err)?.len();
    let digest = digest_reader(&mut file, len).await.map_err(read_err)?;

    debug!(%digest, len, "digested file");
    Ok(digest)
}

/// Digest `len` bytes from `reader` in sequential fixed-size chunks.
pub async fn digest_reader<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: u64,
) -> std::io::Result<MediaDigest> {
    let mut stream = Md5Stream::new();
    let mut buf = vec![0u8; CHUNK_SIZE.min(len as usize)];
    let mut remaining = len;

    while remaining > 0 {
        let take = remaining.min(CHUNK_SIZE as u64) as usize;
        let chunk = &mut buf[..take];
        reader.read_exact(chunk).await?;
        stream.update(chunk);
        remaining -= take as u64;
    }

    Ok(stream.finalize())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    fn reference_digest(bytes: &[u8]) -> String {
        format!("{:x}", md5::compute(bytes))
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn chunk_boundaries_do_not_affect_digest() {
        let data = patterned(5 * 1024 * 1024 + 17);

        let mut whole = Md5Stream::new();
        whole.update(&data);

        let mut uneven = Md5Stream::new();
        for part in data.chunks(777_777) {
            uneven.update(part);
        }

        let mut aligned = Md5Stream::new();
        for part in data.chunks(CHUNK_SIZE) {
            aligned.update(part);
        }

        let expected = reference_digest(&data);
        assert_eq!(whole.finalize().as_str(), expected);
        assert_eq!(uneven.finalize().as_str(), expected);
        assert_eq!(aligned.finalize().as_str(), expected);
    }

    #[test]
    fn different_bytes_give_different_digests() {
        let a = patterned(4096);
        let mut b = a.clone();
        b[1000] ^= 0x01;

        let mut hash_a = Md5Stream::new();
        hash_a.update(&a);
        let mut hash_b = Md5Stream::new();
        hash_b.update(&b);

        assert_ne!(hash_a.finalize(), hash_b.finalize());
    }

    /// Wraps a reader and counts how many reads it serves. `Cursor` always
    /// fills the destination buffer in one poll, so each `read_exact` of a
    /// chunk is exactly one read here.
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        reads: usize,
    }

    impl AsyncRead for CountingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            self.reads += 1;
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    #[tokio::test]
    async fn five_mib_stream_reads_three_chunks_in_order() {
        let data = patterned(5 * 1024 * 1024);
        let expected = reference_digest(&data);
        let len = data.len() as u64;

        let mut reader = CountingReader {
            inner: Cursor::new(data),
            reads: 0,
        };

        let digest = digest_reader(&mut reader, len).await.unwrap();
        assert_eq!(digest.as_str(), expected);
        // 2 MiB + 2 MiB + 1 MiB
        assert_eq!(reader.reads, 3);
    }

    #[tokio::test]
    async fn digest_file_matches_whole_file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        let data = patterned(3 * 1024 * 1024 + 5);
        std::fs::write(&path, &data).unwrap();

        let digest = digest_file(&path).await.unwrap();
        assert_eq!(digest.as_str(), reference_digest(&data));

        // Same bytes under a different name hash identically.
        let copy = dir.path().join("renamed.webm");
        std::fs::write(&copy, &data).unwrap();
        assert_eq!(digest_file(&copy).await.unwrap(), digest);
    }

    #[tokio::test]
    async fn empty_file_digests_to_md5_of_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();

        let digest = digest_file(&path).await.unwrap();
        assert_eq!(digest.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = digest_file(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, OratorError::Read { .. }));
    }
}
