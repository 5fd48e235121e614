use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope code for authentication and authorization failures.
pub const CODE_ACCESS_DENIED: u32 = 403;
/// Envelope code for unreadable request bodies.
pub const CODE_BAD_REQUEST: u32 = 400;
/// Envelope code for token issuance failures.
pub const CODE_SIGNING_FAILED: u32 = 50001;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity lookup miss.
    #[error("record not found: {kind} {key}")]
    NotFound { kind: &'static str, key: String },
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Invalid permission input.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
    /// Two rows of one collection share an identifier.
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
    /// Two users share a username.
    #[error("duplicate username {0}")]
    DuplicateUsername(String),
    /// Missing or ill-formed bearer header, or an unparsable token.
    #[error("malformed token: {0}")]
    MalformedToken(String),
    /// Token `exp` has passed.
    #[error("token expired")]
    ExpiredToken,
    /// Token `nbf` lies in the future.
    #[error("token not yet valid")]
    ImmatureToken,
    /// Sign-in username or password did not match.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// Token signature does not match the configured secret.
    #[error("invalid token signature")]
    InvalidSignature,
    /// Token was signed with an algorithm outside the accepted family.
    #[error("invalid signing algorithm")]
    InvalidAlgorithm,
    /// Token subject no longer resolves to a user.
    #[error("account does not exist")]
    AccountNotFound,
    /// A protected request reached authorization without a subject.
    #[error("request is not authenticated")]
    Unauthenticated,
    /// No permission of the subject matches the request.
    #[error("no permission to do {action} on {resource}")]
    AuthorizationDenied { action: String, resource: String },
    /// Token issuance failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Returns whether the error rejects the caller's identity.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::InvalidCredentials
                | Self::ExpiredToken
                | Self::ImmatureToken
                | Self::InvalidSignature
                | Self::InvalidAlgorithm
                | Self::AccountNotFound
                | Self::Unauthenticated
        )
    }

    /// Returns the response envelope code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::Signing(_) => CODE_SIGNING_FAILED,
            Self::InvalidId(_) | Self::InvalidPermission(_) => CODE_BAD_REQUEST,
            _ => CODE_ACCESS_DENIED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_authentication_errors() {
        assert!(Error::ExpiredToken.is_authentication());
        assert!(Error::MalformedToken("empty".to_string()).is_authentication());
        assert!(!Error::Signing("boom".to_string()).is_authentication());
    }

    #[test]
    fn signing_failures_use_their_own_code_family() {
        assert_eq!(Error::Signing("boom".to_string()).code(), CODE_SIGNING_FAILED);
        assert_eq!(Error::InvalidSignature.code(), CODE_ACCESS_DENIED);
        let denied = Error::AuthorizationDenied {
            action: "GET".to_string(),
            resource: "/users".to_string(),
        };
        assert_eq!(denied.code(), CODE_ACCESS_DENIED);
        assert_eq!(denied.to_string(), "no permission to do GET on /users");
    }
}
