//! Access entry repository implementation.
//!
//! Subtree propagation addresses "all descendants" through the
//! materialized-path prefix, the same mechanism the folder repository
//! uses for rename and delete cascades.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::access::{AccessEntry, AccessRole, ResourceType};

use super::descendant_pattern;

/// Repository for per-resource access lists.
#[derive(Debug, Clone)]
pub struct AccessRepository {
    pool: SqlitePool,
}

impl AccessRepository {
    /// Create a new access repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the entry for one user on one resource, if present.
    pub async fn find_entry(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<AccessEntry>> {
        sqlx::query_as::<_, AccessEntry>(
            "SELECT * FROM access_entries \
             WHERE resource_type = ? AND resource_id = ? AND user_id = ?",
        )
        .bind(resource_type)
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find access entry", e))
    }

    /// List the full access list of a resource.
    pub async fn list_for_resource(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
    ) -> AppResult<Vec<AccessEntry>> {
        sqlx::query_as::<_, AccessEntry>(
            "SELECT * FROM access_entries \
             WHERE resource_type = ? AND resource_id = ? ORDER BY granted_at ASC",
        )
        .bind(resource_type)
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list access entries", e))
    }

    /// The transactional variant of [`Self::list_for_resource`].
    pub async fn list_for_resource_tx(
        &self,
        conn: &mut SqliteConnection,
        resource_type: ResourceType,
        resource_id: Uuid,
    ) -> AppResult<Vec<AccessEntry>> {
        sqlx::query_as::<_, AccessEntry>(
            "SELECT * FROM access_entries \
             WHERE resource_type = ? AND resource_id = ? ORDER BY granted_at ASC",
        )
        .bind(resource_type)
        .bind(resource_id)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list access entries", e))
    }

    /// Seed a freshly created resource with its single owner entry.
    pub async fn seed_owner(
        &self,
        conn: &mut SqliteConnection,
        resource_type: ResourceType,
        resource_id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO access_entries \
             (resource_type, resource_id, user_id, role, granted_by, granted_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(resource_type)
        .bind(resource_id)
        .bind(owner_id)
        .bind(AccessRole::Owner)
        .bind(owner_id)
        .bind(now)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to seed owner entry", e))?;
        Ok(())
    }

    /// Replace a resource's access list with the given entries.
    pub async fn replace_for_resource(
        &self,
        conn: &mut SqliteConnection,
        resource_type: ResourceType,
        resource_id: Uuid,
        entries: &[AccessEntry],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM access_entries WHERE resource_type = ? AND resource_id = ?")
            .bind(resource_type)
            .bind(resource_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear access entries", e)
            })?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO access_entries \
                 (resource_type, resource_id, user_id, role, granted_by, granted_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(resource_type)
            .bind(resource_id)
            .bind(entry.user_id)
            .bind(entry.role)
            .bind(entry.granted_by)
            .bind(entry.granted_at)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert access entry", e)
            })?;
        }
        Ok(())
    }

    /// Copy one folder's access list onto another folder, replacing
    /// whatever the target had. Used for parent-ACL inheritance at
    /// folder creation.
    pub async fn copy_folder_acl(
        &self,
        conn: &mut SqliteConnection,
        source_folder: Uuid,
        target_folder: Uuid,
    ) -> AppResult<u64> {
        sqlx::query("DELETE FROM access_entries WHERE resource_type = 'folder' AND resource_id = ?")
            .bind(target_folder)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear target access list", e)
            })?;

        let result = sqlx::query(
            "INSERT INTO access_entries \
             (resource_type, resource_id, user_id, role, granted_by, granted_at) \
             SELECT 'folder', ?, user_id, role, granted_by, granted_at \
             FROM access_entries WHERE resource_type = 'folder' AND resource_id = ?",
        )
        .bind(target_folder)
        .bind(source_folder)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to copy access list", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Overwrite the access list of every live descendant folder of
    /// `root_path` and every live document in the subtree rooted at
    /// `root_id` with the given snapshot. Destructive by design: any
    /// descendant-specific grant is discarded.
    pub async fn overwrite_subtree(
        &self,
        conn: &mut SqliteConnection,
        root_id: Uuid,
        root_path: &str,
        snapshot: &[AccessEntry],
    ) -> AppResult<()> {
        let pattern = descendant_pattern(root_path);

        sqlx::query(
            "DELETE FROM access_entries WHERE resource_type = 'folder' AND resource_id IN ( \
                 SELECT id FROM folders WHERE is_deleted = 0 AND path LIKE ? ESCAPE '\\')",
        )
        .bind(&pattern)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear descendant folder ACLs", e)
        })?;

        sqlx::query(
            "DELETE FROM access_entries WHERE resource_type = 'document' AND resource_id IN ( \
                 SELECT id FROM documents WHERE is_deleted = 0 AND folder_id IN ( \
                     SELECT id FROM folders \
                     WHERE is_deleted = 0 AND (id = ? OR path LIKE ? ESCAPE '\\')))",
        )
        .bind(root_id)
        .bind(&pattern)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear subtree document ACLs", e)
        })?;

        for entry in snapshot {
            sqlx::query(
                "INSERT INTO access_entries \
                 (resource_type, resource_id, user_id, role, granted_by, granted_at) \
                 SELECT 'folder', id, ?, ?, ?, ? FROM folders \
                 WHERE is_deleted = 0 AND path LIKE ? ESCAPE '\\'",
            )
            .bind(entry.user_id)
            .bind(entry.role)
            .bind(entry.granted_by)
            .bind(entry.granted_at)
            .bind(&pattern)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to propagate folder ACLs", e)
            })?;

            sqlx::query(
                "INSERT INTO access_entries \
                 (resource_type, resource_id, user_id, role, granted_by, granted_at) \
                 SELECT 'document', id, ?, ?, ?, ? FROM documents \
                 WHERE is_deleted = 0 AND folder_id IN ( \
                     SELECT id FROM folders \
                     WHERE is_deleted = 0 AND (id = ? OR path LIKE ? ESCAPE '\\'))",
            )
            .bind(entry.user_id)
            .bind(entry.role)
            .bind(entry.granted_by)
            .bind(entry.granted_at)
            .bind(root_id)
            .bind(&pattern)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to propagate document ACLs", e)
            })?;
        }
        Ok(())
    }
}
