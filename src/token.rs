//! Signed, expiring bearer tokens.
//!
//! Tokens are HMAC-signed JWTs carrying the subject's [`UserId`] in the `uid`
//! claim. The signing secret is a single shared key supplied through
//! [`TokenConfig`]; rotating it invalidates every outstanding token.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::error::{Error, Result};
use crate::types::UserId;

/// Default token lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Issues and verifies bearer tokens bound to a subject.
pub trait TokenService: Send + Sync {
    /// Issues a token for `subject`.
    fn sign(&self, subject: &UserId) -> Result<String>;

    /// Verifies `token` and returns the embedded subject.
    ///
    /// The subject is not checked against any store.
    fn verify(&self, token: &str) -> Result<UserId>;
}

/// Token settings.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    issuer: String,
    audience: String,
    subject: String,
    ttl: Duration,
    leeway: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("subject", &self.subject)
            .field("ttl", &self.ttl)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl TokenConfig {
    /// Creates settings with the given HMAC secret and default claims.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            issuer: "issuer".to_string(),
            audience: "audience".to_string(),
            subject: "subject".to_string(),
            ttl: DEFAULT_TTL,
            leeway: Duration::ZERO,
        }
    }

    /// Sets the `iss` claim issued and required.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the `aud` claim issued and required.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Sets the `sub` placeholder claim.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the token lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the clock skew tolerated for `exp` and `nbf`.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub uid: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Subject placeholder.
    pub sub: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Not before, seconds since the epoch.
    pub nbf: i64,
    /// Expires at, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `subject` issued at `issued_at`.
    pub fn new(config: &TokenConfig, subject: &UserId, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(config.ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            uid: subject.to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            sub: config.subject.clone(),
            iat,
            nbf: iat,
            exp: iat.saturating_add(ttl),
        }
    }
}

/// HMAC JWT implementation of [`TokenService`].
#[derive(Clone)]
pub struct JwtTokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("config", &self.config)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtTokenService {
    /// Creates a token service from settings.
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = config.leeway.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            config,
        }
    }

    /// Returns the settings.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Signs prepared claims.
    pub fn sign_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|err| Error::Signing(err.to_string()))
    }

    /// Verifies `token` and returns its claims.
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        if token.is_empty() {
            return Err(Error::MalformedToken("empty token".to_string()));
        }
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            let mapped = map_jwt_error(&err);
            tracing::debug!(error = %err, "token rejected");
            mapped
        })?;
        Ok(data.claims)
    }
}

impl TokenService for JwtTokenService {
    fn sign(&self, subject: &UserId) -> Result<String> {
        self.sign_claims(&Claims::new(&self.config, subject, Utc::now()))
    }

    fn verify(&self, token: &str) -> Result<UserId> {
        let claims = self.decode_claims(token)?;
        UserId::new(&claims.uid).map_err(|_| Error::MalformedToken("invalid uid claim".to_string()))
    }
}

fn map_jwt_error(err: &jsonwebtoken::errors::Error) -> Error {
    match err.kind() {
        ErrorKind::ExpiredSignature => Error::ExpiredToken,
        ErrorKind::ImmatureSignature => Error::ImmatureToken,
        ErrorKind::InvalidSignature => Error::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => Error::InvalidAlgorithm,
        _ => Error::MalformedToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Standard JOSE header `{"alg":"RS256","typ":"JWT"}`, base64url encoded.
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";

    fn service() -> JwtTokenService {
        JwtTokenService::new(TokenConfig::new("test-secret"))
    }

    #[test]
    fn verify_should_return_signed_subject() {
        let tokens = service();
        let subject = UserId::generate();
        let token = tokens.sign(&subject).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), subject);
    }

    #[test]
    fn sign_should_expire_after_ttl() {
        let tokens = service();
        let subject = UserId::generate();
        let token = tokens.sign(&subject).unwrap();
        let claims = tokens.decode_claims(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.iss, "issuer");
        assert_eq!(claims.aud, "audience");
        assert_eq!(claims.sub, "subject");
        assert_eq!(claims.uid, subject.as_str());
    }

    #[test]
    fn verify_should_reject_empty_token() {
        let result = service().verify("");
        assert!(matches!(result, Err(Error::MalformedToken(_))));
    }

    #[test]
    fn verify_should_reject_garbage() {
        let result = service().verify("not-a-jwt");
        assert!(matches!(result, Err(Error::MalformedToken(_))));
    }

    #[test]
    fn verify_should_reject_expired_token() {
        let tokens = service();
        let issued = Utc::now() - chrono::Duration::days(2);
        let claims = Claims::new(tokens.config(), &UserId::generate(), issued);
        let token = tokens.sign_claims(&claims).unwrap();

        assert!(matches!(tokens.verify(&token), Err(Error::ExpiredToken)));
    }

    #[test]
    fn verify_should_reject_token_not_yet_valid() {
        let tokens = service();
        let issued = Utc::now() + chrono::Duration::hours(1);
        let claims = Claims::new(tokens.config(), &UserId::generate(), issued);
        let token = tokens.sign_claims(&claims).unwrap();

        assert!(matches!(tokens.verify(&token), Err(Error::ImmatureToken)));
    }

    #[test]
    fn verify_should_reject_foreign_secret() {
        let other = JwtTokenService::new(TokenConfig::new("other-secret"));
        let token = other.sign(&UserId::generate()).unwrap();

        assert!(matches!(service().verify(&token), Err(Error::InvalidSignature)));
    }

    #[test]
    fn verify_should_reject_other_algorithm_family() {
        let tokens = service();
        let token = tokens.sign(&UserId::generate()).unwrap();
        let (_, rest) = token.split_once('.').unwrap();
        let forged = format!("{RS256_HEADER}.{rest}");

        assert!(matches!(tokens.verify(&forged), Err(Error::InvalidAlgorithm)));
    }

    #[test]
    fn verify_should_reject_foreign_audience() {
        let other = JwtTokenService::new(TokenConfig::new("test-secret").audience("elsewhere"));
        let token = other.sign(&UserId::generate()).unwrap();

        assert!(matches!(service().verify(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn debug_should_redact_secret() {
        let rendered = format!("{:?}", TokenConfig::new("very-secret"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
