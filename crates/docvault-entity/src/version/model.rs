//! Version entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::number::VersionNumber;

/// One version of a document's content chain.
///
/// `(document_id, major, minor)` is unique; the constraint is the
/// authoritative guard against concurrent allocation of the same number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Version {
    /// Unique version record identifier.
    pub id: Uuid,
    /// The document this version belongs to (weak reference).
    pub document_id: Uuid,
    /// Major component of the version number.
    pub major: i64,
    /// Minor component of the version number.
    pub minor: i64,
    /// Opaque blob-store key for the content bytes.
    pub file_key: String,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// Content MIME type.
    pub mime_type: String,
    /// Who allocated this version.
    pub created_by: Uuid,
    /// When this version was allocated.
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// The typed version number of this record.
    pub fn number(&self) -> VersionNumber {
        VersionNumber {
            major: self.major as u32,
            minor: self.minor as u8,
        }
    }
}

/// Data required to insert a new version row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVersion {
    /// The document being versioned.
    pub document_id: Uuid,
    /// The allocated version number.
    pub number: VersionNumber,
    /// Opaque blob-store key.
    pub file_key: String,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// Content MIME type.
    pub mime_type: String,
    /// The allocating user.
    pub created_by: Uuid,
}
