//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A folder in the document hierarchy.
///
/// The `path` field is the materialized path invariant:
/// `parent.path + "/" + name`, or `"/" + name` for a root folder. It is
/// recomputed on every rename and rewritten for the whole subtree in one
/// batch.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Parent folder ID (None for root folders). A weak back-reference
    /// used only for lookup, never for lifecycle.
    pub parent_id: Option<Uuid>,
    /// Folder name. Unique among live siblings under the same parent.
    pub name: String,
    /// Full materialized path (e.g., `/documents/reports`).
    pub path: String,
    /// Depth in the folder tree (0 for root).
    pub depth: i64,
    /// User who created the folder.
    pub created_by: Uuid,
    /// User who last updated the folder.
    pub updated_by: Uuid,
    /// Soft-delete marker. Deleted records persist for audit.
    pub is_deleted: bool,
    /// When the folder was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who soft-deleted the folder.
    pub deleted_by: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The materialized path of this folder's parent, derived by
    /// stripping the trailing `/name` segment. Empty for roots, and
    /// empty when the path does not end in `/name` at all (a corrupt
    /// row must not panic mid-operation).
    pub fn parent_path(&self) -> &str {
        self.path
            .strip_suffix(self.name.as_str())
            .and_then(|prefix| prefix.strip_suffix('/'))
            .unwrap_or("")
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Parent folder (None for root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: String,
    /// Depth in the tree.
    pub depth: i64,
    /// The user creating the folder (becomes its initial owner).
    pub created_by: Uuid,
}

/// Compose a child path from an optional parent path and a name.
///
/// Roots hang off `"/"`: `compose_path(None, "A")` is `/A`,
/// `compose_path(Some("/A"), "B")` is `/A/B`.
pub fn compose_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) => format!("{parent}/{name}"),
        None => format!("/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn folder(name: &str, path: &str, parent: Option<Uuid>) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            parent_id: parent,
            name: name.to_string(),
            path: path.to_string(),
            depth: 0,
            created_by: Uuid::new_v4(),
            updated_by: Uuid::new_v4(),
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_path() {
        assert_eq!(compose_path(None, "A"), "/A");
        assert_eq!(compose_path(Some("/A"), "B"), "/A/B");
        assert_eq!(compose_path(Some("/A/B"), "C"), "/A/B/C");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(folder("A", "/A", None).parent_path(), "");
        let parent = Uuid::new_v4();
        assert_eq!(folder("B", "/A/B", Some(parent)).parent_path(), "/A");
        assert_eq!(folder("C", "/A/B/C", Some(parent)).parent_path(), "/A/B");
    }

    #[test]
    fn test_parent_path_on_corrupt_row_is_empty() {
        let parent = Uuid::new_v4();
        // Path no longer ends in "/name": derive nothing, don't panic.
        assert_eq!(folder("B", "/other", Some(parent)).parent_path(), "");
        assert_eq!(folder("long-name", "/x", Some(parent)).parent_path(), "");
        assert_eq!(folder("B", "B", Some(parent)).parent_path(), "");
    }

    #[test]
    fn test_is_root() {
        assert!(folder("A", "/A", None).is_root());
        assert!(!folder("B", "/A/B", Some(Uuid::new_v4())).is_root());
    }
}
