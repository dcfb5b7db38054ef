//! Tree service: folder/document lifecycle over materialized paths.
//!
//! Renames and deletes never recurse in application code. The subtree
//! is addressed through the path prefix and rewritten or stamped with
//! set-based SQL inside a single transaction.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_entity::access::{AccessRole, ResourceType};
use docvault_entity::document::{CreateDocument, Document};
use docvault_entity::folder::{compose_path, CreateFolder, Folder};
use docvault_store::repositories::access::AccessRepository;
use docvault_store::repositories::document::DocumentRepository;
use docvault_store::repositories::folder::FolderRepository;
use docvault_store::TxnCoordinator;

use crate::access::AccessController;
use crate::context::RequestContext;

/// Characters rejected in folder names and document titles.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum length of a folder name or document title.
const MAX_NAME_LEN: usize = 255;

/// Live contents of a folder, filtered to what the requester may view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContents {
    /// Live child folders.
    pub folders: Vec<Folder>,
    /// Live documents directly inside the folder.
    pub documents: Vec<Document>,
}

/// Soft-deleted records directly under a folder (audit listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedContents {
    /// Soft-deleted child folders.
    pub folders: Vec<Folder>,
    /// Soft-deleted documents directly inside the folder.
    pub documents: Vec<Document>,
}

/// Partial update of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocument {
    /// New title, if changing.
    pub title: Option<String>,
    /// New containing folder, if moving. The inner `None` moves the
    /// document to the root level.
    pub folder_id: Option<Option<Uuid>>,
}

/// Maintains the folder/document hierarchy.
#[derive(Debug, Clone)]
pub struct TreeService {
    folder_repo: Arc<FolderRepository>,
    document_repo: Arc<DocumentRepository>,
    access_repo: Arc<AccessRepository>,
    access: Arc<AccessController>,
    txn: Arc<TxnCoordinator>,
}

impl TreeService {
    /// Create a new tree service.
    pub fn new(
        folder_repo: Arc<FolderRepository>,
        document_repo: Arc<DocumentRepository>,
        access_repo: Arc<AccessRepository>,
        access: Arc<AccessController>,
        txn: Arc<TxnCoordinator>,
    ) -> Self {
        Self {
            folder_repo,
            document_repo,
            access_repo,
            access,
            txn,
        }
    }

    /// Create a folder under `parent_id` (None for a root folder).
    ///
    /// The caller becomes the initial owner; when a parent exists, the
    /// new folder's access list is overwritten with the parent's current
    /// snapshot inside the same transaction.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let name = validate_name(name)?;

        let parent = match parent_id {
            Some(id) => {
                let parent = self
                    .folder_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Parent folder {id} not found")))?;
                self.access
                    .require_access(ResourceType::Folder, parent.id, ctx.user_id, AccessRole::Editor)
                    .await?;
                Some(parent)
            }
            None => None,
        };

        if let Some(existing) = self.folder_repo.find_child_by_name(parent_id, &name).await? {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists here",
                existing.name
            )));
        }

        let data = CreateFolder {
            parent_id,
            path: compose_path(parent.as_ref().map(|p| p.path.as_str()), &name),
            depth: parent.as_ref().map_or(0, |p| p.depth + 1),
            name,
            created_by: ctx.user_id,
        };

        let folder_repo = &self.folder_repo;
        let access_repo = &self.access_repo;
        let data = &data;
        let owner_id = ctx.user_id;

        let folder = self
            .txn
            .run("create_folder", |mut txn| async move {
                let result = async {
                    if folder_repo
                        .find_child_by_name_tx(&mut txn, data.parent_id, &data.name)
                        .await?
                        .is_some()
                    {
                        return Err(AppError::conflict(format!(
                            "A folder named '{}' already exists here",
                            data.name
                        )));
                    }

                    let folder = folder_repo.create(&mut txn, data).await?;

                    let inherited = match data.parent_id {
                        Some(parent_id) => {
                            access_repo
                                .copy_folder_acl(&mut txn, parent_id, folder.id)
                                .await?
                        }
                        None => 0,
                    };
                    if inherited == 0 {
                        access_repo
                            .seed_owner(
                                &mut txn,
                                ResourceType::Folder,
                                folder.id,
                                owner_id,
                                folder.created_at,
                            )
                            .await?;
                    }

                    Ok(folder)
                }
                .await;
                (txn, result)
            })
            .await?;

        info!(
            folder_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );
        Ok(folder)
    }

    /// Create a document inside `folder_id` (None for the root level).
    ///
    /// The caller is seeded as the only owner; folder permissions are
    /// not copied, resolution walks the chain dynamically.
    pub async fn create_document(
        &self,
        ctx: &RequestContext,
        title: &str,
        folder_id: Option<Uuid>,
    ) -> AppResult<Document> {
        let title = validate_name(title)?;

        let folder = match folder_id {
            Some(id) => {
                let folder = self
                    .folder_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
                self.access
                    .require_access(ResourceType::Folder, folder.id, ctx.user_id, AccessRole::Editor)
                    .await?;
                Some(folder)
            }
            None => None,
        };

        if self
            .document_repo
            .find_by_title(folder_id, &title)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A document titled '{title}' already exists in this folder"
            )));
        }

        let data = CreateDocument {
            folder_id,
            path: compose_path(folder.as_ref().map(|f| f.path.as_str()), &title),
            title,
            created_by: ctx.user_id,
        };

        let document_repo = &self.document_repo;
        let access_repo = &self.access_repo;
        let data = &data;
        let owner_id = ctx.user_id;

        let document = self
            .txn
            .run("create_document", |mut txn| async move {
                let result = async {
                    let document = document_repo.create(&mut txn, data).await?;
                    access_repo
                        .seed_owner(
                            &mut txn,
                            ResourceType::Document,
                            document.id,
                            owner_id,
                            document.created_at,
                        )
                        .await?;
                    Ok(document)
                }
                .await;
                (txn, result)
            })
            .await?;

        info!(
            document_id = %document.id,
            path = %document.path,
            "Document created"
        );
        Ok(document)
    }

    /// Rename a folder, rewriting the materialized paths of every live
    /// descendant folder and document in the same transaction.
    ///
    /// Renaming to the current name is a no-op returning the folder
    /// unchanged.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let new_name = validate_name(new_name)?;

        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        self.access
            .require_access(ResourceType::Folder, folder.id, ctx.user_id, AccessRole::Editor)
            .await?;

        if folder.name == new_name {
            return Ok(folder);
        }

        if self
            .folder_repo
            .find_child_by_name(folder.parent_id, &new_name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{new_name}' already exists here"
            )));
        }

        let old_path = folder.path.clone();
        let new_path = compose_path(
            (!folder.is_root()).then(|| folder.parent_path()),
            &new_name,
        );

        let folder_repo = &self.folder_repo;
        let document_repo = &self.document_repo;
        let old_path = old_path.as_str();
        let new_path = new_path.as_str();
        let new_name = new_name.as_str();
        let updated_by = ctx.user_id;
        let now = Utc::now();

        let (renamed, folders_moved, documents_moved) = self
            .txn
            .run("rename_folder", |mut txn| async move {
                let result = async {
                    let renamed = folder_repo
                        .rename(&mut txn, folder_id, new_name, new_path, updated_by, now)
                        .await?;
                    let folders_moved = folder_repo
                        .rewrite_descendant_paths(&mut txn, old_path, new_path, updated_by, now)
                        .await?;
                    let documents_moved = document_repo
                        .rewrite_descendant_paths(&mut txn, old_path, new_path, updated_by, now)
                        .await?;
                    Ok((renamed, folders_moved, documents_moved))
                }
                .await;
                (txn, result)
            })
            .await?;

        info!(
            folder_id = %folder_id,
            old_path = %old_path,
            new_path = %new_path,
            folders_moved,
            documents_moved,
            "Folder renamed, descendant paths rewritten"
        );
        Ok(renamed)
    }

    /// Soft-delete a folder, every live descendant folder, and every
    /// live document in those folders, all in one transaction.
    ///
    /// Returns the number of folders and documents stamped.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<(u64, u64)> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        self.access
            .require_access(ResourceType::Folder, folder.id, ctx.user_id, AccessRole::Editor)
            .await?;

        let folder_repo = &self.folder_repo;
        let document_repo = &self.document_repo;
        let path = folder.path.as_str();
        let deleted_by = ctx.user_id;
        let now = Utc::now();

        let (folders_deleted, documents_deleted) = self
            .txn
            .run("delete_folder", |mut txn| async move {
                let result = async {
                    // Documents first: their subselect only matches
                    // folders that are still live.
                    let documents_deleted = document_repo
                        .soft_delete_in_subtree(&mut txn, folder_id, path, deleted_by, now)
                        .await?;
                    let folders_deleted = folder_repo
                        .soft_delete_subtree(&mut txn, folder_id, path, deleted_by, now)
                        .await?;
                    Ok((folders_deleted, documents_deleted))
                }
                .await;
                (txn, result)
            })
            .await?;

        info!(
            folder_id = %folder_id,
            path = %path,
            folders_deleted,
            documents_deleted,
            "Folder subtree soft-deleted"
        );
        Ok((folders_deleted, documents_deleted))
    }

    /// Live contents of a folder, filtered to records the requester can
    /// view.
    pub async fn get_contents(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<FolderContents> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        self.access
            .require_access(ResourceType::Folder, folder.id, ctx.user_id, AccessRole::Viewer)
            .await?;

        let mut folders = Vec::new();
        for child in self.folder_repo.find_children(folder.id).await? {
            if self
                .access
                .has_access(ResourceType::Folder, child.id, ctx.user_id, AccessRole::Viewer)
                .await
            {
                folders.push(child);
            }
        }

        let mut documents = Vec::new();
        for document in self.document_repo.find_in_folder(Some(folder.id)).await? {
            if self
                .access
                .has_access(ResourceType::Document, document.id, ctx.user_id, AccessRole::Viewer)
                .await
            {
                documents.push(document);
            }
        }

        Ok(FolderContents { folders, documents })
    }

    /// Live root folders visible to the requester.
    pub async fn list_root_folders(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        let mut visible = Vec::new();
        for folder in self.folder_repo.find_roots().await? {
            if self
                .access
                .has_access(ResourceType::Folder, folder.id, ctx.user_id, AccessRole::Viewer)
                .await
            {
                visible.push(folder);
            }
        }
        Ok(visible)
    }

    /// Fetch a live document. Viewer required.
    pub async fn get_document(&self, ctx: &RequestContext, document_id: Uuid) -> AppResult<Document> {
        let document = self
            .document_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        self.access
            .require_access(ResourceType::Document, document.id, ctx.user_id, AccessRole::Viewer)
            .await?;
        Ok(document)
    }

    /// Retitle and/or move a live document. Editor required on the
    /// document, and on the target folder when moving into one.
    pub async fn update_document(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        changes: UpdateDocument,
    ) -> AppResult<Document> {
        let document = self
            .document_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        self.access
            .require_access(ResourceType::Document, document.id, ctx.user_id, AccessRole::Editor)
            .await?;

        let title = match changes.title {
            Some(title) => validate_name(&title)?,
            None => document.title.clone(),
        };
        let folder_id = changes.folder_id.unwrap_or(document.folder_id);

        let folder_path = match folder_id {
            Some(id) => {
                let folder = self
                    .folder_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Target folder {id} not found")))?;
                if document.folder_id != Some(id) {
                    self.access
                        .require_access(
                            ResourceType::Folder,
                            folder.id,
                            ctx.user_id,
                            AccessRole::Editor,
                        )
                        .await?;
                }
                Some(folder.path)
            }
            None => None,
        };

        if title != document.title || folder_id != document.folder_id {
            if let Some(existing) = self.document_repo.find_by_title(folder_id, &title).await? {
                if existing.id != document.id {
                    return Err(AppError::conflict(format!(
                        "A document titled '{title}' already exists in this folder"
                    )));
                }
            }
        }

        let updated = self
            .document_repo
            .update(&Document {
                folder_id,
                path: compose_path(folder_path.as_deref(), &title),
                title,
                updated_by: ctx.user_id,
                updated_at: Utc::now(),
                ..document
            })
            .await?;

        info!(document_id = %updated.id, path = %updated.path, "Document updated");
        Ok(updated)
    }

    /// Soft-delete a single live document. Editor required.
    pub async fn delete_document(&self, ctx: &RequestContext, document_id: Uuid) -> AppResult<()> {
        let document = self
            .document_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        self.access
            .require_access(ResourceType::Document, document.id, ctx.user_id, AccessRole::Editor)
            .await?;

        let deleted = self
            .document_repo
            .soft_delete(document.id, ctx.user_id, Utc::now())
            .await?;
        if !deleted {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found"
            )));
        }

        info!(document_id = %document_id, "Document soft-deleted");
        Ok(())
    }

    /// Audit listing of the soft-deleted records directly under a
    /// folder. The folder itself may be deleted; an explicit owner
    /// entry on it is required, the ancestor chain is not consulted.
    pub async fn deleted_contents(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<DeletedContents> {
        let folder = self
            .folder_repo
            .find_by_id_any(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        let entry = self
            .access_repo
            .find_entry(ResourceType::Folder, folder.id, ctx.user_id)
            .await?;
        if !entry.is_some_and(|e| e.role == AccessRole::Owner) {
            return Err(AppError::forbidden(
                "Only a folder owner may list its deleted contents",
            ));
        }

        let folders = self.folder_repo.find_deleted_children(folder.id).await?;
        let documents = self.document_repo.find_deleted_in_folder(folder.id).await?;
        Ok(DeletedContents { folders, documents })
    }
}

/// Validate and normalize a folder name or document title.
fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if trimmed
        .chars()
        .any(|c| c.is_control() || INVALID_NAME_CHARS.contains(&c))
    {
        return Err(AppError::validation(format!(
            "Name '{trimmed}' contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  Reports  ").unwrap(), "Reports");
    }

    #[test]
    fn test_validate_name_rejects_empty() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_name_rejects_separators_and_controls() {
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
        assert!(validate_name("a\tb").is_err());
        assert!(validate_name("a*b").is_err());
    }

    #[test]
    fn test_validate_name_rejects_overlong() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name(&long).is_err());
        let max = "x".repeat(MAX_NAME_LEN);
        assert_eq!(validate_name(&max).unwrap(), max);
    }
}
