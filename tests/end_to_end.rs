#![cfg(feature = "axum")]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use futures::executor::block_on;
use rs_rbac::axum::{AppState, Envelope, router};
use rs_rbac::seed::demo_snapshot;
use rs_rbac::{CODE_ACCESS_DENIED, Claims, JwtTokenService, TokenConfig, TokenService, User};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "end-to-end-secret";

struct App {
    router: Router,
    tokens: Arc<JwtTokenService>,
}

fn app() -> App {
    let tokens = Arc::new(JwtTokenService::new(TokenConfig::new(SECRET)));
    let router = router(AppState::new(demo_snapshot().unwrap(), tokens.clone()));
    App { router, tokens }
}

fn send(app: &App, request: Request<Body>) -> (StatusCode, Envelope<Value>) {
    block_on(async {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    })
}

fn sign_in_request(username: &str, password: &str) -> Request<Body> {
    let body = serde_json::json!({ "username": username, "password": password });
    Request::builder()
        .method(Method::POST)
        .uri("/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn protected_request(method: Method, path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn sign_in(app: &App, username: &str) -> String {
    let (status, envelope) = send(app, sign_in_request(username, username));
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.is_success(), "{}", envelope.message);
    envelope.data.unwrap().as_str().unwrap().to_string()
}

#[test]
fn root_should_list_users() {
    let app = app();
    let token = sign_in(&app, "root");

    let (status, envelope) = send(&app, protected_request(Method::GET, "/users", &token));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope.code, 0);
    let users = envelope.data.unwrap();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|user| user.get("password").is_none()));
}

#[test]
fn user1_should_be_denied_users_with_method_and_path_named() {
    let app = app();
    let token = sign_in(&app, "user1");

    let (status, envelope) = send(&app, protected_request(Method::GET, "/users", &token));

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(envelope.code, CODE_ACCESS_DENIED);
    assert!(envelope.message.contains("GET"), "{}", envelope.message);
    assert!(envelope.message.contains("/users"), "{}", envelope.message);
    assert!(envelope.data.is_none());
}

#[test]
fn user1_should_reach_jobs() {
    let app = app();
    let token = sign_in(&app, "user1");

    for method in [Method::GET, Method::POST] {
        let (status, envelope) = send(&app, protected_request(method, "/jobs", &token));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.data, Some(Value::from("jobs")));
    }
}

#[test]
fn sign_in_should_reject_bad_credentials() {
    let app = app();

    for (username, password) in [("root", "wrong"), ("nobody", "nobody")] {
        let (status, envelope) = send(&app, sign_in_request(username, password));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(envelope.code, CODE_ACCESS_DENIED);
        assert!(envelope.message.starts_with("authentication error"));
    }
}

#[test]
fn sign_in_should_reject_unreadable_body() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, envelope) = send(&app, request);

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(envelope.code, 0);
}

#[test]
fn sign_in_should_ignore_authorization_header() {
    let app = app();
    let mut request = sign_in_request("root", "root");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer garbage".parse().unwrap());

    let (status, envelope) = send(&app, request);

    assert_eq!(status, StatusCode::OK);
    assert!(envelope.is_success());
}

#[test]
fn protected_route_should_require_bearer_header() {
    let app = app();
    let request = Request::builder().uri("/jobs").body(Body::empty()).unwrap();

    let (status, envelope) = send(&app, request);

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        envelope.message.contains("malformed token"),
        "{}",
        envelope.message
    );
}

#[test]
fn expired_token_should_be_rejected() {
    let app = app();
    let token = sign_in(&app, "root");
    let subject = app.tokens.verify(&token).unwrap();
    let issued = chrono::Utc::now() - chrono::Duration::days(2);
    let expired = app
        .tokens
        .sign_claims(&Claims::new(app.tokens.config(), &subject, issued))
        .unwrap();

    let (status, envelope) = send(&app, protected_request(Method::GET, "/jobs", &expired));

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(envelope.message.contains("expired"), "{}", envelope.message);
}

#[test]
fn token_for_unknown_account_should_be_rejected() {
    let app = app();
    let stranger = User::new("stranger", "stranger");
    let token = app.tokens.sign(&stranger.id).unwrap();

    let (status, envelope) = send(&app, protected_request(Method::GET, "/jobs", &token));

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        envelope.message.contains("account does not exist"),
        "{}",
        envelope.message
    );
}
