//! Version repository implementation.
//!
//! The `(document_id, major, minor)` unique constraint is the
//! compare-and-insert guard for concurrent allocation: the losing
//! writer surfaces a Conflict instead of silently skipping.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::version::{CreateVersion, Version, VersionNumber};

use super::is_unique_violation;

/// Repository for per-document version chains.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: SqlitePool,
}

impl VersionRepository {
    /// Create a new version repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The latest version of a document, or None when no version exists.
    pub async fn latest(&self, document_id: Uuid) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE document_id = ? \
             ORDER BY major DESC, minor DESC LIMIT 1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find latest version", e))
    }

    /// Whether a specific version number already exists for a document.
    pub async fn exists(&self, document_id: Uuid, number: VersionNumber) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM versions WHERE document_id = ? AND major = ? AND minor = ?",
        )
        .bind(document_id)
        .bind(number.major as i64)
        .bind(number.minor as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check version", e))?;
        Ok(count > 0)
    }

    /// List a document's versions, newest first.
    pub async fn list(&self, document_id: Uuid) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE document_id = ? ORDER BY major DESC, minor DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    /// Insert a new version row. A unique-constraint violation maps to
    /// Conflict: the number was allocated concurrently.
    pub async fn create(&self, data: &CreateVersion) -> AppResult<Version> {
        sqlx::query_as::<_, Version>(
            "INSERT INTO versions \
             (id, document_id, major, minor, file_key, size_bytes, mime_type, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.document_id)
        .bind(data.number.major as i64)
        .bind(data.number.minor as i64)
        .bind(&data.file_key)
        .bind(data.size_bytes)
        .bind(&data.mime_type)
        .bind(data.created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "Version {} already exists for this document",
                    data.number
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create version", e)
            }
        })
    }

    /// Delete every version row of a document, returning the removed
    /// records so the caller can release their blobs.
    pub async fn delete_all(&self, document_id: Uuid) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>("DELETE FROM versions WHERE document_id = ? RETURNING *")
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete versions", e)
            })
    }
}
