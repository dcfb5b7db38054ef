//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A document inside the folder hierarchy.
///
/// Like folders, documents carry a materialized `path` (the containing
/// folder's path plus the title) that is rewritten by folder rename
/// cascades.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// Containing folder (None for root-level documents). A weak
    /// back-reference used only for lookup.
    pub folder_id: Option<Uuid>,
    /// Document title. Unique among live documents of the same folder.
    pub title: String,
    /// Full materialized path (e.g., `/documents/reports/q3.pdf`).
    pub path: String,
    /// User who created the document.
    pub created_by: Uuid,
    /// User who last updated the document.
    pub updated_by: Uuid,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// When the document was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who soft-deleted the document.
    pub deleted_by: Option<Uuid>,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the document was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// Containing folder (None for root level).
    pub folder_id: Option<Uuid>,
    /// Document title.
    pub title: String,
    /// Full materialized path.
    pub path: String,
    /// The user creating the document (becomes its initial owner).
    pub created_by: Uuid,
}
