//! Version sequencer: allocation and validation of `major.minor`
//! version numbers along a document's version chain.
//!
//! Validation reads are advisory; the `(document_id, major, minor)`
//! unique constraint is the authoritative compare-and-insert guard, so
//! a losing concurrent allocation surfaces a Conflict even when the
//! pre-checks raced past each other.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::blob::BlobStore;
use docvault_entity::version::{CreateVersion, Version, VersionNumber};
use docvault_store::repositories::version::VersionRepository;

use crate::context::RequestContext;

/// Lifetime of presigned download URLs in version listings.
pub const PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

/// A version record paired with a presigned download URL.
#[derive(Debug, Clone, Serialize)]
pub struct VersionListing {
    /// The version record.
    pub version: Version,
    /// Time-limited download URL for the version's content.
    pub download_url: String,
}

/// Allocates and lists document versions.
#[derive(Debug, Clone)]
pub struct VersionSequencer {
    version_repo: Arc<VersionRepository>,
    blob_store: Arc<dyn BlobStore>,
}

impl VersionSequencer {
    /// Create a new version sequencer.
    pub fn new(version_repo: Arc<VersionRepository>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            version_repo,
            blob_store,
        }
    }

    /// Allocate the next version of a document.
    ///
    /// With `explicit = None` the minor-increment successor of the
    /// latest version is taken (`1.0` when no version exists). An
    /// explicit number must parse as `major.minor` with a single
    /// fractional digit, must not already exist, and must be a legal
    /// successor of the current latest version.
    pub async fn allocate(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        explicit: Option<&str>,
        file_key: String,
        size_bytes: i64,
        mime_type: String,
    ) -> AppResult<Version> {
        let latest = self
            .version_repo
            .latest(document_id)
            .await?
            .map(|v| v.number());

        let number = match explicit {
            Some(raw) => {
                let number: VersionNumber = raw.parse()?;
                if self.version_repo.exists(document_id, number).await? {
                    return Err(AppError::conflict(format!(
                        "Version {number} already exists for this document"
                    )));
                }
                if !number.follows(latest) {
                    return Err(match latest {
                        Some(prev) => AppError::validation(format!(
                            "Version {number} does not follow {prev}: expected {} or {}",
                            prev.next_minor(),
                            prev.next_major()
                        )),
                        None => AppError::validation(format!(
                            "First version must be {}, got {number}",
                            VersionNumber::INITIAL
                        )),
                    });
                }
                number
            }
            None => latest.map_or(VersionNumber::INITIAL, |prev| prev.next_minor()),
        };

        let version = self
            .version_repo
            .create(&CreateVersion {
                document_id,
                number,
                file_key,
                size_bytes,
                mime_type,
                created_by: ctx.user_id,
            })
            .await?;

        info!(
            document_id = %document_id,
            version = %version.number(),
            "Version allocated"
        );
        Ok(version)
    }

    /// The latest version number of a document, or None when the
    /// document has no versions.
    pub async fn latest_version_number(
        &self,
        document_id: Uuid,
    ) -> AppResult<Option<VersionNumber>> {
        Ok(self
            .version_repo
            .latest(document_id)
            .await?
            .map(|v| v.number()))
    }

    /// List a document's versions newest first, each with a presigned
    /// download URL.
    pub async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<VersionListing>> {
        let versions = self.version_repo.list(document_id).await?;
        let mut listings = Vec::with_capacity(versions.len());
        for version in versions {
            let download_url = self.blob_store.presign(&version.file_key, PRESIGN_TTL).await?;
            listings.push(VersionListing {
                version,
                download_url,
            });
        }
        Ok(listings)
    }

    /// Remove every version of a document and release its blobs.
    ///
    /// Blob deletion is best-effort: a failing delete is logged and the
    /// removal continues, the rows are already gone.
    pub async fn remove_all(&self, document_id: Uuid) -> AppResult<u64> {
        let removed = self.version_repo.delete_all(document_id).await?;
        let count = removed.len() as u64;

        for version in removed {
            if let Err(err) = self.blob_store.delete(&version.file_key).await {
                warn!(
                    document_id = %document_id,
                    file_key = %version.file_key,
                    error = %err,
                    "Failed to delete version blob"
                );
            }
        }

        info!(document_id = %document_id, count, "All versions removed");
        Ok(count)
    }
}
