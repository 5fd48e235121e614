//! Demo data set used by the sample server.

use crate::error::Result;
use crate::model::{Role, User};
use crate::permission::Permission;
use crate::snapshot::Snapshot;

/// Builds the demo snapshot.
///
/// `root` holds role `root` granting `(*, *)`; `user1` holds role `user`
/// granting `(GET, /jobs)` and `(POST, /jobs)`. A `(GET, /users)` permission
/// exists but is granted to no role. Passwords equal usernames.
pub fn demo_snapshot() -> Result<Snapshot> {
    let root = User::new("root", "root");
    let user1 = User::new("user1", "user1");
    let root_role = Role::new("root");
    let user_role = Role::new("user");

    let everything = Permission::universal();
    let read_users = Permission::new("GET", "/users")?;
    let read_jobs = Permission::new("GET", "/jobs")?;
    let create_jobs = Permission::new("POST", "/jobs")?;

    Snapshot::builder()
        .assign_role(&root.id, &root_role.id)
        .assign_role(&user1.id, &user_role.id)
        .grant(&root_role.id, &everything.id)
        .grant(&user_role.id, &read_jobs.id)
        .grant(&user_role.id, &create_jobs.id)
        .user(root)
        .user(user1)
        .role(root_role)
        .role(user_role)
        .permission(everything)
        .permission(read_users)
        .permission(read_jobs)
        .permission(create_jobs)
        .build()
}
