use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Role, RolePermission, User, UserRole};
use crate::permission::Permission;
use crate::store::RbacStore;
use crate::types::{PermissionId, RoleId, UserId};

/// Immutable in-memory RBAC data set.
///
/// Built once through [`SnapshotBuilder`] and shared read-only afterwards;
/// clones share the same backing rows.
#[derive(Debug, Clone)]
pub struct Snapshot {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: Vec<UserRole>,
    role_permissions: Vec<RolePermission>,
    user_index: HashMap<UserId, usize>,
    username_index: HashMap<String, usize>,
    role_index: HashMap<RoleId, usize>,
    permission_index: HashMap<PermissionId, usize>,
}

impl Snapshot {
    /// Starts an empty builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Returns all users in insertion order.
    pub fn users(&self) -> &[User] {
        &self.inner.users
    }

    /// Returns all roles in insertion order.
    pub fn roles(&self) -> &[Role] {
        &self.inner.roles
    }

    /// Returns all permissions in insertion order.
    pub fn permissions(&self) -> &[Permission] {
        &self.inner.permissions
    }

    /// Returns all user to role rows in insertion order.
    pub fn user_roles(&self) -> &[UserRole] {
        &self.inner.user_roles
    }

    /// Returns all role to permission rows in insertion order.
    pub fn role_permissions(&self) -> &[RolePermission] {
        &self.inner.role_permissions
    }
}

impl RbacStore for Snapshot {
    fn find_user_by_id(&self, id: &UserId) -> Result<&User> {
        self.inner
            .user_index
            .get(id)
            .map(|&idx| &self.inner.users[idx])
            .ok_or_else(|| Error::not_found("user", id.as_str()))
    }

    fn find_user_by_username(&self, username: &str) -> Result<&User> {
        self.inner
            .username_index
            .get(username)
            .map(|&idx| &self.inner.users[idx])
            .ok_or_else(|| Error::not_found("user", username))
    }

    fn find_role_by_id(&self, id: &RoleId) -> Result<&Role> {
        self.inner
            .role_index
            .get(id)
            .map(|&idx| &self.inner.roles[idx])
            .ok_or_else(|| Error::not_found("role", id.as_str()))
    }

    fn find_permission_by_id(&self, id: &PermissionId) -> Result<&Permission> {
        self.inner
            .permission_index
            .get(id)
            .map(|&idx| &self.inner.permissions[idx])
            .ok_or_else(|| Error::not_found("permission", id.as_str()))
    }

    fn role_of_user(&self, user: &UserId) -> Result<&RoleId> {
        self.inner
            .user_roles
            .iter()
            .find(|row| &row.user_id == user)
            .map(|row| &row.role_id)
            .ok_or_else(|| Error::not_found("user role", user.as_str()))
    }

    fn role_permission_ids(&self, role: &RoleId) -> Vec<&PermissionId> {
        self.inner
            .role_permissions
            .iter()
            .filter(|row| &row.role_id == role)
            .map(|row| &row.permission_id)
            .collect()
    }
}

/// Collects rows for a [`Snapshot`].
///
/// Junction rows are not checked against the entity collections: a row
/// pointing at a missing user, role or permission is kept and skipped when
/// queried.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: Vec<UserRole>,
    role_permissions: Vec<RolePermission>,
}

impl SnapshotBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Adds a role.
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Adds a permission.
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Appends a user to role row with a fresh identifier.
    pub fn assign_role(self, user: &UserId, role: &RoleId) -> Self {
        self.user_role(UserRole::new(user.clone(), role.clone()))
    }

    /// Appends a role to permission row with a fresh identifier.
    pub fn grant(self, role: &RoleId, permission: &PermissionId) -> Self {
        self.role_permission(RolePermission::new(role.clone(), permission.clone()))
    }

    /// Appends a prepared user to role row.
    pub fn user_role(mut self, row: UserRole) -> Self {
        self.user_roles.push(row);
        self
    }

    /// Appends a prepared role to permission row.
    pub fn role_permission(mut self, row: RolePermission) -> Self {
        self.role_permissions.push(row);
        self
    }

    /// Freezes the collected rows.
    ///
    /// Fails when two rows of one collection share an identifier or two
    /// users share a username.
    pub fn build(self) -> Result<Snapshot> {
        let user_index = index_by(&self.users, "user", |user| &user.id)?;
        let role_index = index_by(&self.roles, "role", |role| &role.id)?;
        let permission_index =
            index_by(&self.permissions, "permission", |permission| &permission.id)?;
        index_by(&self.user_roles, "user role", |row| &row.id)?;
        index_by(&self.role_permissions, "role permission", |row| &row.id)?;

        let mut username_index = HashMap::with_capacity(self.users.len());
        for (idx, user) in self.users.iter().enumerate() {
            if username_index.insert(user.username.clone(), idx).is_some() {
                return Err(Error::DuplicateUsername(user.username.clone()));
            }
        }

        tracing::debug!(
            users = self.users.len(),
            roles = self.roles.len(),
            permissions = self.permissions.len(),
            user_roles = self.user_roles.len(),
            role_permissions = self.role_permissions.len(),
            "rbac snapshot built"
        );

        Ok(Snapshot {
            inner: Arc::new(Inner {
                users: self.users,
                roles: self.roles,
                permissions: self.permissions,
                user_roles: self.user_roles,
                role_permissions: self.role_permissions,
                user_index,
                username_index,
                role_index,
                permission_index,
            }),
        })
    }
}

fn index_by<T, K, F>(rows: &[T], kind: &'static str, key: F) -> Result<HashMap<K, usize>>
where
    K: Clone + Eq + Hash + AsRef<str>,
    F: Fn(&T) -> &K,
{
    let mut index = HashMap::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        match index.entry(key(row).clone()) {
            Entry::Occupied(entry) => {
                let id: &K = entry.key();
                return Err(Error::DuplicateId {
                    kind,
                    id: id.as_ref().to_string(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(idx);
            }
        }
    }
    Ok(index)
}
