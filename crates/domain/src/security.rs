use std::str::FromStr;

use gridform_core::AppError;
use serde::{Deserialize, Serialize};

/// Permission code granting every record capability.
pub const ADMIN_PERMISSION_CODE: &str = "ADMIN";

/// Record-level capabilities checked by detail forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPermission {
    /// Allows reading a record.
    View,
    /// Allows changing a persisted record.
    Edit,
    /// Allows deleting a record.
    Delete,
    /// Allows creating a record.
    Create,
}

impl RecordPermission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }

    /// Returns all record permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RecordPermission] = &[
            RecordPermission::View,
            RecordPermission::Edit,
            RecordPermission::Delete,
            RecordPermission::Create,
        ];

        ALL
    }

    /// Returns the permission code granting this capability on a record type,
    /// e.g. `PermissionRole_EDIT`.
    #[must_use]
    pub fn code_for(&self, record_type: &str) -> String {
        format!("{record_type}_{}", self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for RecordPermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "create" => Ok(Self::Create),
            _ => Err(AppError::Validation(format!(
                "unknown record permission '{value}'"
            ))),
        }
    }
}

/// Capabilities evaluated for one actor and one record instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCapabilities {
    /// Record may be viewed.
    pub can_view: bool,
    /// Record may be edited.
    pub can_edit: bool,
    /// Record may be deleted.
    pub can_delete: bool,
    /// Records of this type may be created.
    pub can_create: bool,
}

impl RecordCapabilities {
    /// Every capability granted.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            can_view: true,
            can_edit: true,
            can_delete: true,
            can_create: true,
        }
    }

    /// Returns whether one capability is granted.
    #[must_use]
    pub fn allows(&self, permission: RecordPermission) -> bool {
        match permission {
            RecordPermission::View => self.can_view,
            RecordPermission::Edit => self.can_edit,
            RecordPermission::Delete => self.can_delete,
            RecordPermission::Create => self.can_create,
        }
    }
}
