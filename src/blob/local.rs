//! Local-disk blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::BlobError;

use super::{is_plain_key, BlobStore, ByteStream, MediaKind};

/// Stores each media kind in its own directory.
///
/// Directories are created on first write. Keys must be plain file names;
/// every path is canonicalized and checked to stay inside its root before
/// the filesystem is touched for reads or deletes.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    video_dir: PathBuf,
    pdf_dir: PathBuf,
    video_limit: u64,
    pdf_limit: u64,
}

impl LocalBlobStore {
    /// Create a store with the default per-kind caps.
    pub fn new(video_dir: impl Into<PathBuf>, pdf_dir: impl Into<PathBuf>) -> Self {
        Self {
            video_dir: video_dir.into(),
            pdf_dir: pdf_dir.into(),
            video_limit: MediaKind::Video.max_bytes(),
            pdf_limit: MediaKind::Pdf.max_bytes(),
        }
    }

    /// Override the size cap for one media kind.
    pub fn with_limit(mut self, kind: MediaKind, bytes: u64) -> Self {
        match kind {
            MediaKind::Video => self.video_limit = bytes,
            MediaKind::Pdf => self.pdf_limit = bytes,
        }
        self
    }

    /// Root directory for a media kind.
    pub fn root(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Video => &self.video_dir,
            MediaKind::Pdf => &self.pdf_dir,
        }
    }

    /// Create the root directory for `kind` if it does not exist yet.
    pub async fn ensure_root(&self, kind: MediaKind) -> Result<(), BlobError> {
        fs::create_dir_all(self.root(kind)).await?;
        Ok(())
    }

    /// Resolve `key` to an existing file inside the root for `kind`.
    ///
    /// Fails with `InvalidKey` if the key has directory components or the
    /// canonical path escapes the root (e.g. through a symlink), and with
    /// `NotFound` if no such file exists.
    pub async fn resolve_existing(&self, kind: MediaKind, key: &str) -> Result<PathBuf, BlobError> {
        if !is_plain_key(key) {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        let root = match fs::canonicalize(self.root(kind)).await {
            Ok(root) => root,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(kind.served_path(key)));
            }
            Err(err) => return Err(err.into()),
        };

        let candidate = match fs::canonicalize(root.join(key)).await {
            Ok(path) => path,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(kind.served_path(key)));
            }
            Err(err) => return Err(err.into()),
        };

        if !candidate.starts_with(&root) {
            warn!(
                key,
                resolved = %candidate.display(),
                "Blob key resolves outside its storage root"
            );
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        Ok(candidate)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        kind: MediaKind,
        key: &str,
        mut body: ByteStream<'_>,
    ) -> Result<u64, BlobError> {
        if !is_plain_key(key) {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        self.ensure_root(kind).await?;
        let path = self.root(kind).join(key);
        let limit = self.max_bytes(kind);

        let mut file = fs::File::create_new(&path).await?;
        let mut written: u64 = 0;

        let result: Result<(), BlobError> = async {
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                written += chunk.len() as u64;
                if written > limit {
                    return Err(BlobError::TooLarge { limit });
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(err) = result {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(err);
        }

        debug!(path = %path.display(), bytes = written, "Stored upload");
        Ok(written)
    }

    fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Video => self.video_limit,
            MediaKind::Pdf => self.pdf_limit,
        }
    }

    async fn delete(&self, kind: MediaKind, key: &str) -> Result<(), BlobError> {
        let path = self.resolve_existing(kind, key).await?;
        fs::remove_file(&path).await?;
        debug!(path = %path.display(), "Deleted upload");
        Ok(())
    }

    async fn size(&self, kind: MediaKind, key: &str) -> Result<u64, BlobError> {
        let path = self.resolve_existing(kind, key).await?;
        Ok(fs::metadata(&path).await?.len())
    }

    fn served_root(&self, kind: MediaKind) -> Option<&Path> {
        Some(self.root(kind))
    }
}
