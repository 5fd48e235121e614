use crate::error::{Error, Result};
use crate::model::Timestamps;
use crate::types::PermissionId;
use std::fmt;

/// Value of `action` or `resource` that matches anything.
pub const WILDCARD: &str = "*";

/// Right to perform `action` on `resource`.
///
/// Only the fully wildcarded `(*, *)` permission matches more than one
/// request; a wildcard in a single field never matches on its own.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permission {
    /// Identifier.
    #[cfg_attr(feature = "serde", serde(rename = "uuid"))]
    pub id: PermissionId,
    /// Action, typically an HTTP method.
    pub action: String,
    /// Resource, typically a URL path.
    pub resource: String,
    /// Timestamps.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timestamps: Timestamps,
}

impl Permission {
    /// Creates a permission with a fresh identifier.
    ///
    /// Both segments are trimmed and must not be empty. They are not
    /// normalized otherwise: matching is exact and case-sensitive.
    pub fn new(action: impl AsRef<str>, resource: impl AsRef<str>) -> Result<Self> {
        let action = validate_segment(action.as_ref(), "action")?;
        let resource = validate_segment(resource.as_ref(), "resource")?;
        Ok(Self {
            id: PermissionId::generate(),
            action,
            resource,
            timestamps: Timestamps::now(),
        })
    }

    /// Creates the `(*, *)` permission.
    pub fn universal() -> Self {
        Self {
            id: PermissionId::generate(),
            action: WILDCARD.to_string(),
            resource: WILDCARD.to_string(),
            timestamps: Timestamps::now(),
        }
    }

    /// Returns whether both fields are wildcards.
    pub fn is_universal(&self) -> bool {
        self.action == WILDCARD && self.resource == WILDCARD
    }

    /// Returns whether this permission allows `action` on `resource`.
    pub fn grants(&self, action: &str, resource: &str) -> bool {
        self.is_universal() || (self.action == action && self.resource == resource)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.action, self.resource)
    }
}

fn validate_segment(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPermission(format!("{kind} must not be empty")));
    }
    Ok(trimmed.to_string())
}
