//! Access entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::AccessRole;

/// Resource type for access entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A folder resource.
    Folder,
    /// A document resource.
    Document,
}

impl ResourceType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "document" => Ok(Self::Document),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid resource type: '{s}'"
            ))),
        }
    }
}

/// One element of a resource's access list: a `(user, role)` grant.
///
/// At most one entry exists per `(resource, user)` pair, and every live
/// folder or document keeps at least one `owner` entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessEntry {
    /// Type of resource this entry applies to.
    pub resource_type: ResourceType,
    /// ID of the resource.
    pub resource_id: Uuid,
    /// User granted the role.
    pub user_id: Uuid,
    /// The granted role.
    pub role: AccessRole,
    /// Who granted this entry.
    pub granted_by: Uuid,
    /// When this entry was created.
    pub granted_at: DateTime<Utc>,
}
