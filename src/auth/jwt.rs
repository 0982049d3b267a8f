//! JWT Token Service
//!
//! Handles JWT creation, validation, and claims management for magic links and
//! sessions. Both token kinds are HS256-signed with the same injected secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ISSUER: &str = "cogs-server";

/// Which flow a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Emailed, single-use, short-lived
    MagicLink,
    /// Returned by redemption, reusable until expiry
    Session,
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub kind: TokenKind,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Token lifetimes
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub magic_link: Duration,
    pub session: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            magic_link: Duration::minutes(5),
            session: Duration::hours(24),
        }
    }
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttls: TokenTtls,
}

impl TokenService {
    /// Create a new JWT service with the provided secret
    pub fn new(secret: &str, ttls: TokenTtls) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttls,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::MagicLink => self.ttls.magic_link,
            TokenKind::Session => self.ttls.session,
        }
    }

    /// Sign a token of `kind` for `email`, valid from now.
    pub fn issue(&self, email: &str, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(email, kind, Utc::now())
    }

    pub(crate) fn issue_at(&self, email: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            email: email.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Validate signature, expiry and kind, returning the claims.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test_secret", TokenTtls::default())
    }

    #[test]
    fn test_jwt_roundtrip() {
        let tokens = service();
        let token = tokens.issue("test@example.com", TokenKind::Session).unwrap();

        let claims = tokens.verify(&token, TokenKind::Session).unwrap();

        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.kind, TokenKind::Session);
        assert_eq!(claims.iss, "cogs-server");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn magic_link_lives_five_minutes() {
        let tokens = service();
        let token = tokens.issue("test@example.com", TokenKind::MagicLink).unwrap();
        let claims = tokens.verify(&token, TokenKind::MagicLink).unwrap();
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let tokens = service();
        let link = tokens.issue("test@example.com", TokenKind::MagicLink).unwrap();
        assert!(matches!(
            tokens.verify(&link, TokenKind::Session),
            Err(TokenError::WrongKind { expected: TokenKind::Session })
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(1);
        let token = tokens.issue_at("test@example.com", TokenKind::MagicLink, issued).unwrap();
        assert!(matches!(tokens.verify(&token, TokenKind::MagicLink), Err(TokenError::Expired)));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = service().issue("test@example.com", TokenKind::Session).unwrap();
        let other = TokenService::new("another_secret", TokenTtls::default());
        assert!(matches!(other.verify(&token, TokenKind::Session), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(service().verify("not-a-jwt", TokenKind::Session), Err(TokenError::Invalid(_))));
    }
}
