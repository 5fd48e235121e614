use crate::permission::Permission;
use crate::store::RbacStore;
use crate::types::UserId;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Permission is granted.
    Allow,
    /// Permission is denied.
    Deny,
}

impl Decision {
    /// Returns whether the decision is [`Decision::Allow`].
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Resolves a subject's permissions through an [`RbacStore`] and answers
/// allow/deny. Access is denied unless a permission matches.
#[derive(Debug, Clone)]
pub struct Engine<S> {
    store: S,
}

impl<S> Engine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RbacStore> Engine<S> {
    /// Returns whether `subject` may perform `action` on `resource`.
    pub fn has_permission(&self, subject: &UserId, action: &str, resource: &str) -> bool {
        self.authorize(subject, action, resource).is_allowed()
    }

    /// Authorizes `subject` for `action` on `resource`.
    pub fn authorize(&self, subject: &UserId, action: &str, resource: &str) -> Decision {
        let decision = Decision::from(
            self.effective_permissions(subject)
                .iter()
                .any(|permission| permission.grants(action, resource)),
        );
        tracing::debug!(
            subject = %subject,
            action,
            resource,
            decision = ?decision,
            "authorization decided"
        );
        decision
    }

    /// Returns the permissions reachable from the subject's role, in row order.
    ///
    /// A subject without a role has no permissions. Grants pointing at a
    /// missing permission are skipped.
    pub fn effective_permissions(&self, subject: &UserId) -> Vec<&Permission> {
        let Ok(role) = self.store.role_of_user(subject) else {
            return Vec::new();
        };
        self.store
            .role_permission_ids(role)
            .into_iter()
            .filter_map(|id| self.store.find_permission_by_id(id).ok())
            .collect()
    }
}
