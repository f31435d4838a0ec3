//! Bearer token validation (HS256 JWT).
//!
//! The credential's `sub` claim carries the stable user id; expiry is
//! honored. Validation uses the process-wide shared secret from
//! `auth.token_secret`.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token validation errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// The claims the hub cares about. Extra claims are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Stable user id.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Validate a bearer token and return the user id it carries.
pub fn verify(token: &str, secret: &str) -> Result<String, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Ok(data.claims.sub),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e.to_string())),
        },
    }
}

/// Known placeholder secrets that must not reach production.
const WEAK_SECRETS: &[&str] = &["changeme", "secret", "dev-secret", "token-secret"];

/// Whether a configured secret is a default/weak value.
///
/// Mirrors the startup refusal for predictable secrets: anything shorter
/// than 16 bytes or on the placeholder list is rejected unless explicitly
/// overridden.
pub fn is_default_secret(secret: &str) -> bool {
    secret.len() < 16 || WEAK_SECRETS.contains(&secret.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "unit-test-secret-of-decent-length";

    fn make_token(sub: &str, exp: i64, secret: &str) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn valid_token_resolves_to_user_id() {
        let token = make_token("u1", now() + 3600, SECRET);
        assert_eq!(verify(&token, SECRET).unwrap(), "u1");
    }

    #[test]
    fn expired_token_is_rejected() {
        // well past the default validation leeway
        let token = make_token("u1", now() - 3600, SECRET);
        assert!(matches!(verify(&token, SECRET), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = make_token("u1", now() + 3600, SECRET);
        assert!(matches!(
            verify(&token, "some-other-secret-entirely"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            verify("not-a-jwt", SECRET),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn weak_secrets_are_flagged() {
        assert!(is_default_secret("changeme"));
        assert!(is_default_secret("short"));
        assert!(!is_default_secret("Qs8!kPz2vR7mH4xW1c"));
    }
}
