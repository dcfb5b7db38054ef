//! Access role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role granted by an access entry.
///
/// Ordered by privilege: Owner > Editor > Viewer. A role satisfies a
/// requirement when its rank is greater than or equal to the required
/// rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    /// Full control including sharing and deleting.
    Owner,
    /// Can modify content and structure.
    Editor,
    /// Read-only access.
    Viewer,
}

impl AccessRole {
    /// Return the privilege rank (higher = more privileged).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Editor => 2,
            Self::Viewer => 1,
        }
    }

    /// Check if this role grants at least the given level.
    pub fn has_at_least(&self, required: AccessRole) -> bool {
        self.rank() >= required.rank()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessRole {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid access role: '{s}'"
            ))),
        }
    }
}
