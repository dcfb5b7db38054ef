//! Folder repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::folder::{CreateFolder, Folder};

use super::{descendant_pattern, is_unique_violation};

/// Repository for folder CRUD and materialized-path subtree queries.
///
/// Every live-state query names `is_deleted = 0` explicitly; lookups
/// that may see soft-deleted rows are suffixed `_any`.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a live folder by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a folder by ID regardless of deletion state (audit path).
    pub async fn find_by_id_any(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a live folder by ID on a transaction connection.
    pub async fn find_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find the live child of `parent_id` carrying `name`, if any.
    ///
    /// `parent_id = None` addresses root folders; NULL parents compare
    /// equal here (`IS`), unlike plain SQL equality.
    pub async fn find_child_by_name(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id IS ? AND name = ? AND is_deleted = 0",
        )
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find folder by name", e)
        })
    }

    /// The transactional variant of [`Self::find_child_by_name`].
    pub async fn find_child_by_name_tx(
        &self,
        conn: &mut SqliteConnection,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id IS ? AND name = ? AND is_deleted = 0",
        )
        .bind(parent_id)
        .bind(name)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find folder by name", e)
        })
    }

    /// List live root folders.
    pub async fn find_roots(&self) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id IS NULL AND is_deleted = 0 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list root folders", e))
    }

    /// List live direct children of a folder.
    pub async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id = ? AND is_deleted = 0 ORDER BY name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// List soft-deleted direct children of a folder (audit path).
    pub async fn find_deleted_children(&self, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id = ? AND is_deleted = 1 ORDER BY name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list deleted children", e)
        })
    }

    /// List every live descendant of a folder by path prefix.
    pub async fn find_descendants(&self, path: &str) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE path LIKE ? ESCAPE '\\' AND is_deleted = 0 \
             ORDER BY depth ASC, name ASC",
        )
        .bind(descendant_pattern(path))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list descendants", e))
    }

    /// Insert a new folder inside a transaction.
    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        data: &CreateFolder,
    ) -> AppResult<Folder> {
        let now = Utc::now();
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders \
             (id, parent_id, name, path, depth, created_by, updated_by, is_deleted, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.path)
        .bind(data.depth)
        .bind(data.created_by)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("A folder named '{}' already exists here", data.name))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create folder", e)
            }
        })
    }

    /// Update a folder's own name and path inside a transaction.
    pub async fn rename(
        &self,
        conn: &mut SqliteConnection,
        folder_id: Uuid,
        new_name: &str,
        new_path: &str,
        updated_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = ?, path = ?, updated_by = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 RETURNING *",
        )
        .bind(new_name)
        .bind(new_path)
        .bind(updated_by)
        .bind(now)
        .bind(folder_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("A folder named '{new_name}' already exists here"))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to rename folder", e)
            }
        })?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Batch-rewrite the paths of every live descendant folder,
    /// replacing the `old_path` prefix with `new_path` in one statement.
    pub async fn rewrite_descendant_paths(
        &self,
        conn: &mut SqliteConnection,
        old_path: &str,
        new_path: &str,
        updated_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders \
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
            AppError::with_source(ErrorKind::Database, "Failed to rewrite folder paths", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Soft-delete a folder and every live descendant folder in one
    /// set-based statement inside a transaction.
    pub async fn soft_delete_subtree(
        &self,
        conn: &mut SqliteConnection,
        folder_id: Uuid,
        path: &str,
        deleted_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders \
             SET is_deleted = 1, deleted_at = ?, deleted_by = ?, updated_by = ?, updated_at = ? \
             WHERE is_deleted = 0 AND (id = ? OR path LIKE ? ESCAPE '\\')",
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
            AppError::with_source(ErrorKind::Database, "Failed to soft-delete folders", e)
        })?;
        Ok(result.rows_affected())
    }
}
