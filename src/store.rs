use crate::error::Result;
use crate::model::{Role, User};
use crate::permission::Permission;
use crate::types::{PermissionId, RoleId, UserId};

/// Read-only query surface over users, roles, permissions and their junctions.
///
/// Implementations are pure lookups: no method mutates state, and misses are
/// reported as [`Error::NotFound`](crate::Error::NotFound).
pub trait RbacStore: Send + Sync {
    /// Finds a user by identifier.
    fn find_user_by_id(&self, id: &UserId) -> Result<&User>;

    /// Finds a user by username.
    fn find_user_by_username(&self, username: &str) -> Result<&User>;

    /// Finds a role by identifier.
    fn find_role_by_id(&self, id: &RoleId) -> Result<&Role>;

    /// Finds a permission by identifier.
    fn find_permission_by_id(&self, id: &PermissionId) -> Result<&Permission>;

    /// Returns the role of the first assignment row naming `user`.
    ///
    /// Later assignments for the same user are ignored.
    fn role_of_user(&self, user: &UserId) -> Result<&RoleId>;

    /// Returns permission identifiers granted to `role`, in row order.
    ///
    /// Identifiers are returned as stored; they may not resolve.
    fn role_permission_ids(&self, role: &RoleId) -> Vec<&PermissionId>;

    /// Returns the name of the role honored for `user`.
    fn role_name_of_user(&self, user: &UserId) -> Result<&str> {
        let role = self.role_of_user(user)?;
        self.find_role_by_id(role).map(|role| role.name.as_str())
    }
}

impl<T: RbacStore + ?Sized> RbacStore for std::sync::Arc<T> {
    fn find_user_by_id(&self, id: &UserId) -> Result<&User> {
        (**self).find_user_by_id(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<&User> {
        (**self).find_user_by_username(username)
    }

    fn find_role_by_id(&self, id: &RoleId) -> Result<&Role> {
        (**self).find_role_by_id(id)
    }

    fn find_permission_by_id(&self, id: &PermissionId) -> Result<&Permission> {
        (**self).find_permission_by_id(id)
    }

    fn role_of_user(&self, user: &UserId) -> Result<&RoleId> {
        (**self).role_of_user(user)
    }

    fn role_permission_ids(&self, role: &RoleId) -> Vec<&PermissionId> {
        (**self).role_permission_ids(role)
    }
}
