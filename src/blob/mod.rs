//! Blob storage for uploaded media.
//!
//! Uploads are written through the [`BlobStore`] trait so the route logic
//! does not depend on where bytes end up. [`LocalBlobStore`] keeps each
//! [`MediaKind`] in its own directory, which the router also serves
//! statically.

mod local;
mod media;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::BlobError;

pub use local::LocalBlobStore;
pub use media::{extension_of, generate_key, is_plain_key, MediaKind, MAX_PDF_BYTES, MAX_VIDEO_BYTES};

/// A stream of body chunks being uploaded.
pub type ByteStream<'a> = BoxStream<'a, Result<Bytes, BlobError>>;

/// Storage backend for uploaded media.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `body` under `key`, failing with [`BlobError::TooLarge`] once more
    /// than [`BlobStore::max_bytes`] have been received. Nothing is left behind on
    /// failure. Returns the number of bytes written.
    async fn put(&self, kind: MediaKind, key: &str, body: ByteStream<'_>) -> Result<u64, BlobError>;

    /// Remove the blob stored under `key`.
    async fn delete(&self, kind: MediaKind, key: &str) -> Result<(), BlobError>;

    /// Largest blob of this kind the store accepts, in bytes.
    fn max_bytes(&self, kind: MediaKind) -> u64 {
        kind.max_bytes()
    }

    /// Size in bytes of the blob under `key`.
    async fn size(&self, kind: MediaKind, key: &str) -> Result<u64, BlobError>;

    /// Directory holding blobs of this kind, when the backend is a local
    /// filesystem that can be served statically.
    fn served_root(&self, kind: MediaKind) -> Option<&Path>;
}
