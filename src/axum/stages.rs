use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::axum::pipeline::{Call, Next, Stage};
use crate::axum::routes::SIGN_IN_PATH;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::store::RbacStore;
use crate::token::TokenService;
use crate::types::UserId;

use ::axum::http::header::AUTHORIZATION;
use ::axum::http::{HeaderMap, Method};
use ::axum::response::{IntoResponse, Response};

/// Scheme prefix of the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Routes exempt from authentication and authorization.
///
/// One policy instance is shared by both security stages.
#[derive(Debug, Clone, Default)]
pub struct ExemptionPolicy {
    routes: Vec<(Method, String)>,
}

impl ExemptionPolicy {
    /// Creates a policy exempting nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the policy exempting `POST /signin`.
    pub fn sign_in() -> Self {
        Self::new().exempt(Method::POST, SIGN_IN_PATH)
    }

    /// Exempts `method` on `path`.
    pub fn exempt(mut self, method: Method, path: impl Into<String>) -> Self {
        self.routes.push((method, path.into()));
        self
    }

    /// Returns whether `method` on `path` is exempt.
    pub fn is_exempt(&self, method: &Method, path: &str) -> bool {
        self.routes
            .iter()
            .any(|(exempt_method, exempt_path)| exempt_method == method && exempt_path == path)
    }
}

/// Logs method and path, then runs the rest of the request in a span.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingStage;

#[async_trait]
impl Stage for LoggingStage {
    async fn handle(&self, call: Call, next: Next<'_>) -> Response {
        let span = tracing::info_span!(
            "request",
            method = %call.method(),
            path = %call.path()
        );
        span.in_scope(|| tracing::info!("request received"));
        let response = next.run(call).instrument(span.clone()).await;
        span.in_scope(|| tracing::debug!(status = %response.status(), "response sent"));
        response
    }
}

/// Logs wall-clock time spent in the inner stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStage;

#[async_trait]
impl Stage for TimingStage {
    async fn handle(&self, call: Call, next: Next<'_>) -> Response {
        let start = Instant::now();
        let response = next.run(call).await;
        let elapsed = start.elapsed();
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            elapsed_us = elapsed.as_micros() as u64,
            "request completed"
        );
        response
    }
}

/// Verifies the bearer token and attaches the subject to the call.
pub struct AuthenticationStage {
    store: Arc<dyn RbacStore>,
    tokens: Arc<dyn TokenService>,
    exemptions: Arc<ExemptionPolicy>,
}

impl AuthenticationStage {
    /// Creates the stage.
    pub fn new(
        store: Arc<dyn RbacStore>,
        tokens: Arc<dyn TokenService>,
        exemptions: Arc<ExemptionPolicy>,
    ) -> Self {
        Self {
            store,
            tokens,
            exemptions,
        }
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<UserId> {
        let token = bearer_token(headers)?;
        let subject = self.tokens.verify(token)?;
        self.store
            .find_user_by_id(&subject)
            .map_err(|_| Error::AccountNotFound)?;
        Ok(subject)
    }
}

#[async_trait]
impl Stage for AuthenticationStage {
    async fn handle(&self, call: Call, next: Next<'_>) -> Response {
        if self.exemptions.is_exempt(call.method(), call.path()) {
            return next.run(call).await;
        }

        let outcome = self.authenticate(call.request().headers());
        match outcome {
            Ok(subject) => next.run(call.authenticated(subject)).await,
            Err(err) => {
                tracing::warn!(error = %err, "authentication failed");
                err.into_response()
            }
        }
    }
}

/// Checks the authenticated subject's permission for method and path.
pub struct AuthorizationStage {
    engine: Engine<Arc<dyn RbacStore>>,
    exemptions: Arc<ExemptionPolicy>,
}

impl AuthorizationStage {
    /// Creates the stage.
    pub fn new(engine: Engine<Arc<dyn RbacStore>>, exemptions: Arc<ExemptionPolicy>) -> Self {
        Self { engine, exemptions }
    }

    fn authorize(&self, call: &Call) -> Result<()> {
        let subject = call.subject().ok_or(Error::Unauthenticated)?;
        let action = call.method().as_str();
        let resource = call.path();
        if self.engine.has_permission(subject, action, resource) {
            Ok(())
        } else {
            Err(Error::AuthorizationDenied {
                action: action.to_string(),
                resource: resource.to_string(),
            })
        }
    }
}

#[async_trait]
impl Stage for AuthorizationStage {
    async fn handle(&self, call: Call, next: Next<'_>) -> Response {
        if self.exemptions.is_exempt(call.method(), call.path()) {
            return next.run(call).await;
        }

        let outcome = self.authorize(&call);
        match outcome {
            Ok(()) => next.run(call).await,
            Err(err) => {
                tracing::warn!(error = %err, "authorization failed");
                err.into_response()
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::MalformedToken("missing authorization header".to_string()))?;
    let value = value
        .to_str()
        .map_err(|_| Error::MalformedToken("invalid authorization header".to_string()))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| Error::MalformedToken("authorization scheme must be Bearer".to_string()))?;
    if token.contains(BEARER_PREFIX) {
        return Err(Error::MalformedToken("repeated bearer prefix".to_string()));
    }
    Ok(token)
}
