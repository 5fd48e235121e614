//! Response envelope shared by every endpoint and rejection.

use serde::{Deserialize, Serialize};

use crate::error::Error;

use ::axum::Json;
use ::axum::http::StatusCode;
use ::axum::response::{IntoResponse, Response};

/// Envelope code for success.
pub const CODE_OK: u32 = 0;

/// `{code, message, data}` body; `code == 0` denotes success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Zero on success, an error family code otherwise.
    pub code: u32,
    /// Human-readable cause, empty on success.
    pub message: String,
    /// Payload, `null` on failure.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Wraps a successful payload.
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_OK,
            message: String::new(),
            data: Some(data),
        }
    }

    /// Returns whether the envelope reports success.
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}

impl Envelope<()> {
    /// Creates a failure envelope.
    pub fn failure(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = match &self {
            Error::AuthorizationDenied { .. } => format!("authorization error: {self}"),
            err if err.is_authentication() => format!("authentication error: {self}"),
            _ => self.to_string(),
        };
        (status_code(&self), Envelope::failure(self.code(), message)).into_response()
    }
}

fn status_code(error: &Error) -> StatusCode {
    match error {
        Error::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
        Error::InvalidId(_) | Error::InvalidPermission(_) => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Signing(_) | Error::DuplicateId { .. } | Error::DuplicateUsername(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        err if err.is_authentication() => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CODE_ACCESS_DENIED, CODE_SIGNING_FAILED};

    #[test]
    fn authorization_denial_should_be_forbidden() {
        let err = Error::AuthorizationDenied {
            action: "GET".to_string(),
            resource: "/users".to_string(),
        };
        assert_eq!(status_code(&err), StatusCode::FORBIDDEN);
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn token_failures_should_be_unauthorized() {
        for err in [
            Error::ExpiredToken,
            Error::InvalidSignature,
            Error::InvalidAlgorithm,
            Error::AccountNotFound,
            Error::InvalidCredentials,
        ] {
            assert_eq!(status_code(&err), StatusCode::UNAUTHORIZED, "{err}");
            assert_eq!(err.code(), CODE_ACCESS_DENIED);
        }
    }

    #[test]
    fn signing_failure_should_be_internal() {
        let err = Error::Signing("key".to_string());
        assert_eq!(status_code(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), CODE_SIGNING_FAILED);
    }

    #[test]
    fn failure_envelope_should_serialize_null_data() {
        let value = serde_json::to_value(Envelope::failure(403, "nope")).unwrap();
        assert_eq!(value, serde_json::json!({"code": 403, "message": "nope", "data": null}));
    }
}
