//! Entities of the RBAC snapshot.

use chrono::{DateTime, Utc};

use crate::types::{PermissionId, RoleId, RolePermissionId, UserId, UserRoleId};

/// Bookkeeping timestamps shared by every entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamps {
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; reserved, entities are never deleted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Stamps both creation and update with the current time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// Account that can sign in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    /// Identifier.
    #[cfg_attr(feature = "serde", serde(rename = "uuid"))]
    pub id: UserId,
    /// Username, unique within a snapshot.
    pub username: String,
    /// Plaintext credential compared at sign-in.
    #[cfg_attr(feature = "serde", serde(skip_serializing, default))]
    pub password: String,
    /// Timestamps.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timestamps: Timestamps,
}

impl User {
    /// Creates a user with a fresh identifier.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            password: password.into(),
            timestamps: Timestamps::now(),
        }
    }

    /// Compares a sign-in password against the stored one.
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

/// Named bundle of permissions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    /// Identifier.
    #[cfg_attr(feature = "serde", serde(rename = "uuid"))]
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Timestamps.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timestamps: Timestamps,
}

impl Role {
    /// Creates a role with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::generate(),
            name: name.into(),
            timestamps: Timestamps::now(),
        }
    }
}

/// Junction row assigning a role to a user.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserRole {
    /// Identifier.
    #[cfg_attr(feature = "serde", serde(rename = "uuid"))]
    pub id: UserRoleId,
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Timestamps.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timestamps: Timestamps,
}

impl UserRole {
    /// Creates an assignment row with a fresh identifier.
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            id: UserRoleId::generate(),
            user_id,
            role_id,
            timestamps: Timestamps::now(),
        }
    }
}

/// Junction row granting a permission to a role.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RolePermission {
    /// Identifier.
    #[cfg_attr(feature = "serde", serde(rename = "uuid"))]
    pub id: RolePermissionId,
    /// Granted role.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Timestamps.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timestamps: Timestamps,
}

impl RolePermission {
    /// Creates a grant row with a fresh identifier.
    pub fn new(role_id: RoleId, permission_id: PermissionId) -> Self {
        Self {
            id: RolePermissionId::generate(),
            role_id,
            permission_id,
            timestamps: Timestamps::now(),
        }
    }
}
