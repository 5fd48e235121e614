//! Role-based access control core for HTTP services.
//!
//! This crate provides strong-typed identifiers, an immutable RBAC snapshot
//! with a read-only store interface, a deny-by-default authorization engine,
//! HMAC bearer tokens (enable `jwt`) and an ordered axum request pipeline
//! (enable `axum`).
//!
//! # Examples
//!
//! Authorizing against a snapshot:
//! ```
//! use rs_rbac::{Engine, Permission, Role, Snapshot, User};
//!
//! let user = User::new("user1", "user1");
//! let role = Role::new("user");
//! let read_jobs = Permission::new("GET", "/jobs").unwrap();
//! let snapshot = Snapshot::builder()
//!     .assign_role(&user.id, &role.id)
//!     .grant(&role.id, &read_jobs.id)
//!     .user(user.clone())
//!     .role(role)
//!     .permission(read_jobs)
//!     .build()
//!     .unwrap();
//!
//! let engine = Engine::new(snapshot);
//! assert!(engine.has_permission(&user.id, "GET", "/jobs"));
//! assert!(!engine.has_permission(&user.id, "DELETE", "/jobs"));
//! ```
//!
//! Issuing and verifying a token (enable `jwt`):
//! ```no_run
//! # #[cfg(feature = "jwt")]
//! # {
//! use rs_rbac::{JwtTokenService, TokenConfig, TokenService, UserId};
//! let tokens = JwtTokenService::new(TokenConfig::new("change-me"));
//! let subject = UserId::generate();
//! let token = tokens.sign(&subject).unwrap();
//! assert_eq!(tokens.verify(&token).unwrap(), subject);
//! # }
//! ```
#![forbid(unsafe_code)]

mod engine;
mod error;
mod model;
mod permission;
mod snapshot;
mod store;
mod types;

pub mod seed;

#[cfg(feature = "jwt")]
mod token;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::engine::{Decision, Engine};
pub use crate::error::{CODE_ACCESS_DENIED, CODE_BAD_REQUEST, CODE_SIGNING_FAILED, Error, Result};
pub use crate::model::{Role, RolePermission, Timestamps, User, UserRole};
pub use crate::permission::{Permission, WILDCARD};
pub use crate::snapshot::{Snapshot, SnapshotBuilder};
pub use crate::store::RbacStore;
pub use crate::types::{PermissionId, RoleId, RolePermissionId, UserId, UserRoleId};

#[cfg(feature = "jwt")]
pub use crate::token::{Claims, DEFAULT_TTL, JwtTokenService, TokenConfig, TokenService};
