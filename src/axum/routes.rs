//! Sign-in and sample protected endpoints.

use std::sync::Arc;

use serde::Deserialize;

use crate::axum::AuthContext;
use crate::axum::pipeline::{Pipeline, PipelineLayer};
use crate::axum::response::Envelope;
use crate::axum::stages::ExemptionPolicy;
use crate::error::{CODE_BAD_REQUEST, Error, Result};
use crate::model::User;
use crate::snapshot::Snapshot;
use crate::store::RbacStore;
use crate::token::TokenService;

use ::axum::extract::State;
use ::axum::extract::rejection::JsonRejection;
use ::axum::http::StatusCode;
use ::axum::response::{IntoResponse, Response};
use ::axum::routing::{get, post};
use ::axum::{Json, Router};

/// Path of the sign-in endpoint.
pub const SIGN_IN_PATH: &str = "/signin";

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    store: Snapshot,
    tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Creates router state.
    pub fn new(store: Snapshot, tokens: Arc<dyn TokenService>) -> Self {
        Self { store, tokens }
    }
}

/// Sign-in request body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Builds the router with every route behind the standard pipeline.
pub fn router(state: AppState) -> Router {
    let pipeline = Pipeline::standard(
        Arc::new(state.store.clone()),
        state.tokens.clone(),
        ExemptionPolicy::sign_in(),
    );

    Router::new()
        .route(SIGN_IN_PATH, post(sign_in))
        .route("/users", get(list_users))
        .route("/jobs", get(jobs).post(jobs))
        .layer(PipelineLayer::new(pipeline))
        .with_state(state)
}

async fn sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Envelope::failure(CODE_BAD_REQUEST, rejection.body_text()),
            )
                .into_response();
        }
    };

    match issue_token(&state, &request) {
        Ok(token) => Envelope::success(token).into_response(),
        Err(err) => {
            tracing::warn!(username = %request.username, error = %err, "sign-in rejected");
            err.into_response()
        }
    }
}

fn issue_token(state: &AppState, request: &SignInRequest) -> Result<String> {
    let user = state
        .store
        .find_user_by_username(&request.username)
        .map_err(|_| Error::InvalidCredentials)?;
    if !user.password_matches(&request.password) {
        return Err(Error::InvalidCredentials);
    }
    state.tokens.sign(&user.id)
}

async fn list_users(State(state): State<AppState>) -> Envelope<Vec<User>> {
    Envelope::success(state.store.users().to_vec())
}

async fn jobs(auth: AuthContext) -> Envelope<&'static str> {
    tracing::debug!(subject = %auth.subject, "jobs requested");
    Envelope::success("jobs")
}
