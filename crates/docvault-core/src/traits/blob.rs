//! Blob storage trait for the external binary store.
//!
//! The core never touches blob bytes itself: version records persist an
//! opaque `file_key` handed over by the caller, and listings resolve
//! those keys into presigned URLs through this trait. Implementations
//! (local disk, S3) live outside this workspace.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for the external blob storage backend.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store a blob and return its opaque key.
    async fn store(&self, data: Bytes) -> AppResult<String>;

    /// Delete the blob behind a key. Deleting an unknown key is not an
    /// error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Produce a time-limited download URL for a key.
    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String>;
}
