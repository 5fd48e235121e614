//! Axum integration: the request pipeline, the response envelope and the
//! sign-in router.
//!
//! Every request passes Logging, Timing, Authentication and Authorization in
//! that order before reaching a handler. Requests matching the
//! [`ExemptionPolicy`] skip both security stages.

mod pipeline;
mod response;
mod routes;
mod stages;

use ::axum::extract::FromRequestParts;
use ::axum::http::request::Parts;

use crate::error::Error;
use crate::types::UserId;

pub use self::pipeline::{Call, Endpoint, Next, Pipeline, PipelineLayer, PipelineService, Stage};
pub use self::response::{CODE_OK, Envelope};
pub use self::routes::{AppState, SIGN_IN_PATH, SignInRequest, router};
pub use self::stages::{
    AuthenticationStage, AuthorizationStage, BEARER_PREFIX, ExemptionPolicy, LoggingStage,
    TimingStage,
};

/// Authenticated subject of a request, available to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Subject identifier.
    pub subject: UserId,
}

impl AuthContext {
    pub(crate) fn new(subject: UserId) -> Self {
        Self { subject }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(Error::Unauthenticated)
    }
}
