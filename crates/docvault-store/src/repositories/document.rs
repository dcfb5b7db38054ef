//! Document repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::document::{CreateDocument, Document};

use super::{descendant_pattern, is_unique_violation};

/// Repository for document CRUD and cascade participation.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a live document by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    /// Find a document by ID regardless of deletion state (audit path).
    pub async fn find_by_id_any(&self, id: Uuid) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    /// List live documents directly inside a folder (None = root level).
    pub async fn find_in_folder(&self, folder_id: Option<Uuid>) -> AppResult<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE folder_id IS ? AND is_deleted = 0 ORDER BY title ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list documents", e))
    }

    /// List soft-deleted documents directly inside a folder (audit path).
    pub async fn find_deleted_in_folder(&self, folder_id: Uuid) -> AppResult<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE folder_id = ? AND is_deleted = 1 ORDER BY title ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list deleted documents", e)
        })
    }

    /// Find the live document titled `title` in a folder, if any.
    pub async fn find_by_title(
        &self,
        folder_id: Option<Uuid>,
        title: &str,
    ) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE folder_id IS ? AND title = ? AND is_deleted = 0",
        )
        .bind(folder_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find document by title", e)
        })
    }

    /// Insert a new document inside a transaction.
    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        data: &CreateDocument,
    ) -> AppResult<Document> {
        let now = Utc::now();
        sqlx::query_as::<_, Document>(
            "INSERT INTO documents \
             (id, folder_id, title, path, created_by, updated_by, is_deleted, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.folder_id)
        .bind(&data.title)
        .bind(&data.path)
        .bind(data.created_by)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "A document titled '{}' already exists in this folder",
                    data.title
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create document", e)
            }
        })
    }

    /// Update a document's title, folder, and path.
    pub async fn update(&self, document: &Document) -> AppResult<Document> {
        sqlx::query_as::<_, Document>(
            "UPDATE documents SET folder_id = ?, title = ?, path = ?, updated_by = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 RETURNING *",
        )
        .bind(document.folder_id)
        .bind(&document.title)
        .bind(&document.path)
        .bind(document.updated_by)
        .bind(document.updated_at)
        .bind(document.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "A document titled '{}' already exists in this folder",
                    document.title
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to update document", e)
            }
        })?
        .ok_or_else(|| AppError::not_found(format!("Document {} not found", document.id)))
    }

    /// Soft-delete a single live document.
    pub async fn soft_delete(
        &self,
        id: Uuid,
        deleted_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE documents \
             SET is_deleted = 1, deleted_at = ?, deleted_by = ?, updated_by = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(deleted_by)
        .bind(deleted_by)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to soft-delete document", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Batch-rewrite the paths of every live document under `old_path`,
    /// mirroring the folder-path rewrite of a rename cascade.
    pub async fn rewrite_descendant_paths(
        &self,
        conn: &mut SqliteConnection,
        old_path: &str,
        new_path: &str,
        updated_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE documents \
             SET path = ? || substr(path, length(?) + 1), updated_by = ?, updated_at = ? \
             WHERE path LIKE ? ESCAPE '\\' AND is_deleted = 0",
        )
        .bind(new_path)
        .bind(old_path)
        .bind(updated_by)
        .bind(now)
        .bind(descendant_pattern(old_path))
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rewrite document paths", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Soft-delete every live document located in the folder subtree
    /// rooted at `folder_id`/`path`. Must run before the folders
    /// themselves are stamped so the live-folder subselect still matches.
    pub async fn soft_delete_in_subtree(
        &self,
        conn: &mut SqliteConnection,
        folder_id: Uuid,
        path: &str,
        deleted_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE documents \
             SET is_deleted = 1, deleted_at = ?, deleted_by = ?, updated_by = ?, updated_at = ? \
             WHERE is_deleted = 0 AND folder_id IN ( \
                 SELECT id FROM folders \
                 WHERE is_deleted = 0 AND (id = ? OR path LIKE ? ESCAPE '\\'))",
        )
        .bind(now)
        .bind(deleted_by)
        .bind(deleted_by)
        .bind(now)
        .bind(folder_id)
        .bind(descendant_pattern(path))
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to soft-delete documents", e)
        })?;
        Ok(result.rows_affected())
    }
}
