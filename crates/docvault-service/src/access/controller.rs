//! Access controller: ancestor-chain permission resolution and
//! folder-grant propagation.
//!
//! Resolution follows nearest-ancestor-wins: walking up from a resource,
//! the first node carrying an explicit entry for the user decides,
//! whatever its rank. A document's own entry is the one exception: it
//! wins when sufficient but falls through to the folder chain when it
//! is not, so a folder-level editor is not locked out by a stale
//! document-level viewer entry.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_entity::access::{AccessEntry, AccessRole, ResourceType};
use docvault_store::repositories::access::AccessRepository;
use docvault_store::repositories::document::DocumentRepository;
use docvault_store::repositories::folder::FolderRepository;
use docvault_store::TxnCoordinator;

use crate::context::RequestContext;

/// Upper bound on the ancestor walk. Deeper chains indicate corrupt
/// parent links and fail closed.
const MAX_ANCESTOR_DEPTH: usize = 128;

/// Resolves effective permissions and manages folder access lists.
#[derive(Debug, Clone)]
pub struct AccessController {
    folder_repo: Arc<FolderRepository>,
    document_repo: Arc<DocumentRepository>,
    access_repo: Arc<AccessRepository>,
    txn: Arc<TxnCoordinator>,
}

impl AccessController {
    /// Create a new access controller.
    pub fn new(
        folder_repo: Arc<FolderRepository>,
        document_repo: Arc<DocumentRepository>,
        access_repo: Arc<AccessRepository>,
        txn: Arc<TxnCoordinator>,
    ) -> Self {
        Self {
            folder_repo,
            document_repo,
            access_repo,
            txn,
        }
    }

    /// Check whether `user_id` holds at least `required` on a resource.
    ///
    /// Missing or deleted resources resolve to `false`.
    pub async fn check_access(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
        user_id: Uuid,
        required: AccessRole,
    ) -> AppResult<bool> {
        let chain_start = match resource_type {
            ResourceType::Document => {
                // Liveness first: entries survive a soft delete, so a
                // stale direct grant must not resolve a deleted
                // document.
                let Some(document) = self.document_repo.find_by_id(resource_id).await? else {
                    return Ok(false);
                };
                if let Some(entry) = self
                    .access_repo
                    .find_entry(ResourceType::Document, document.id, user_id)
                    .await?
                {
                    if entry.role.has_at_least(required) {
                        return Ok(true);
                    }
                }
                document.folder_id
            }
            ResourceType::Folder => match self.folder_repo.find_by_id(resource_id).await? {
                Some(folder) => Some(folder.id),
                None => return Ok(false),
            },
        };

        let resolved = self.resolve_folder_chain(chain_start, user_id).await?;
        Ok(resolved.is_some_and(|role| role.has_at_least(required)))
    }

    /// Infallible form of [`Self::check_access`] for filtering listings:
    /// any lookup failure resolves to `false`.
    pub async fn has_access(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
        user_id: Uuid,
        required: AccessRole,
    ) -> bool {
        match self
            .check_access(resource_type, resource_id, user_id, required)
            .await
        {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    error = %err,
                    "Access check failed"
                );
                false
            }
        }
    }

    /// Same resolution as [`Self::check_access`], surfacing Forbidden
    /// when insufficient. Ancestor-walk integrity failures propagate as
    /// errors so the calling mutation aborts instead of guessing.
    pub async fn require_access(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
        user_id: Uuid,
        required: AccessRole,
    ) -> AppResult<()> {
        if self
            .check_access(resource_type, resource_id, user_id, required)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Insufficient permissions. Required: {required}"
            )))
        }
    }

    /// Grant (or update) `role` for `target_user` on a folder and
    /// propagate the folder's new access list onto every live
    /// descendant folder and every live document in the subtree.
    ///
    /// Propagation is a destructive overwrite: descendant-specific
    /// grants are discarded, the subtree ends up with the folder's
    /// exact snapshot. Returns the folder's updated access list.
    pub async fn grant_access(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        target_user: Uuid,
        role: AccessRole,
    ) -> AppResult<Vec<AccessEntry>> {
        self.require_access(ResourceType::Folder, folder_id, ctx.user_id, AccessRole::Owner)
            .await?;

        let folder_repo = &self.folder_repo;
        let access_repo = &self.access_repo;
        let granted_by = ctx.user_id;
        let now = Utc::now();

        let entries = self
            .txn
            .run("grant_access", |mut txn| async move {
                let result = async {
                    let folder = folder_repo
                        .find_by_id_tx(&mut txn, folder_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::not_found(format!("Folder {folder_id} not found"))
                        })?;

                    let mut entries = access_repo
                        .list_for_resource_tx(&mut txn, ResourceType::Folder, folder.id)
                        .await?;

                    match entries.iter_mut().find(|e| e.user_id == target_user) {
                        Some(entry) => {
                            entry.role = role;
                            entry.granted_by = granted_by;
                            entry.granted_at = now;
                        }
                        None => entries.push(AccessEntry {
                            resource_type: ResourceType::Folder,
                            resource_id: folder.id,
                            user_id: target_user,
                            role,
                            granted_by,
                            granted_at: now,
                        }),
                    }

                    if !entries.iter().any(|e| e.role == AccessRole::Owner) {
                        return Err(AppError::validation(
                            "Access list must retain at least one owner",
                        ));
                    }

                    access_repo
                        .replace_for_resource(&mut txn, ResourceType::Folder, folder.id, &entries)
                        .await?;
                    access_repo
                        .overwrite_subtree(&mut txn, folder.id, &folder.path, &entries)
                        .await?;

                    Ok(entries)
                }
                .await;
                (txn, result)
            })
            .await?;

        info!(
            folder_id = %folder_id,
            target_user = %target_user,
            role = %role,
            "Access granted and propagated to subtree"
        );
        Ok(entries)
    }

    /// List a folder's access entries. Viewer required.
    pub async fn list_access(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<Vec<AccessEntry>> {
        self.require_access(ResourceType::Folder, folder_id, ctx.user_id, AccessRole::Viewer)
            .await?;
        self.access_repo
            .list_for_resource(ResourceType::Folder, folder_id)
            .await
    }

    /// Walk the folder chain from `start` toward the root, returning the
    /// role of the first explicit entry for `user_id`.
    ///
    /// An ancestor missing from the live set ends the walk with no
    /// grant; a cycle or a chain deeper than [`MAX_ANCESTOR_DEPTH`]
    /// fails closed with an error.
    async fn resolve_folder_chain(
        &self,
        start: Option<Uuid>,
        user_id: Uuid,
    ) -> AppResult<Option<AccessRole>> {
        let mut current = start;
        let mut visited = HashSet::new();

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(folder_id) = current else {
                return Ok(None);
            };
            if !visited.insert(folder_id) {
                return Err(AppError::internal(format!(
                    "Folder ancestry of {folder_id} contains a cycle"
                )));
            }

            if let Some(entry) = self
                .access_repo
                .find_entry(ResourceType::Folder, folder_id, user_id)
                .await?
            {
                return Ok(Some(entry.role));
            }

            current = match self.folder_repo.find_by_id(folder_id).await? {
                Some(folder) => folder.parent_id,
                None => return Ok(None),
            };
        }

        Err(AppError::internal(
            "Folder ancestry exceeds the maximum supported depth",
        ))
    }
}
