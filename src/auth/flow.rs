//! Magic-link authentication flow.
//!
//! A magic-link token moves `issued -> redeemed` or `issued -> expired`; both
//! end states are terminal. Redemption records the token as consumed, which is
//! what makes any later redemption fail, even after the user row has moved on
//! to a newer token.

use lettre::Address;

use crate::auth::jwt::{TokenError, TokenKind, TokenService};
use crate::auth::models::AuthUser;
use crate::database::{Store, StoreError};
use crate::error::AppError;
use crate::mail::{MagicLinkEmail, Mailer};

const INVALID_OR_EXPIRED: &str = "invalid or expired token";
const ALREADY_USED: &str = "token already used";
const AUTHORIZATION_REQUIRED: &str = "authorization required";

/// Trimmed, lower-cased mailbox address.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let candidate = raw.trim().to_lowercase();
    candidate
        .parse::<Address>()
        .map(|address| address.to_string())
        .map_err(|_| AppError::validation("email", "invalid email format"))
}

/// `<frontend_url>?token=<token>`
pub fn magic_link_url(frontend_url: &str, token: &str) -> String {
    let separator = if frontend_url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", frontend_url, separator, token)
}

fn signing_failed(err: TokenError) -> AppError {
    AppError::Internal(format!("failed to sign token: {}", err))
}

fn reject_token(err: TokenError) -> AppError {
    // Expired and forged tokens look the same to the caller.
    tracing::debug!("Token rejected: {}", err);
    AppError::auth(INVALID_OR_EXPIRED)
}

/// Email a fresh magic link to `email`. Exactly one message per call.
pub async fn submit(
    tokens: &TokenService,
    mailer: &dyn Mailer,
    frontend_url: &str,
    email: &str,
) -> Result<(), AppError> {
    let email = normalize_email(email)?;

    let token = tokens
        .issue(&email, TokenKind::MagicLink)
        .map_err(signing_failed)?;
    let link = magic_link_url(frontend_url, &token);
    let valid_minutes = tokens.ttl(TokenKind::MagicLink).num_minutes();

    mailer.send(MagicLinkEmail::build(&email, &link, valid_minutes)).await?;

    tracing::info!("📧 Magic link sent to {}", email);
    Ok(())
}

/// Exchange a magic-link token for a session token.
pub async fn redeem(tokens: &TokenService, store: &dyn Store, token: &str) -> Result<String, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::validation("token", "token is required"));
    }

    let claims = tokens.verify(token, TokenKind::MagicLink).map_err(reject_token)?;

    if store.is_magic_link_consumed(token).await? {
        tracing::warn!("Magic link for {} was already redeemed", claims.email);
        return Err(AppError::auth(ALREADY_USED));
    }

    let session = tokens
        .issue(&claims.email, TokenKind::Session)
        .map_err(signing_failed)?;

    match store.store_access_token(&claims.email, token).await {
        Ok(user) => {
            tracing::info!("🔑 User {} authenticated (id={})", user.email, user.id);
            Ok(session)
        }
        Err(StoreError::Conflict(_)) => {
            tracing::warn!("Concurrent redemption of magic link for {}", claims.email);
            Err(AppError::auth(ALREADY_USED))
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve the `Authorization` header value into the authenticated user.
///
/// Stateless: only signature, expiry and token kind are checked.
pub fn authenticate(tokens: &TokenService, authorization: Option<&str>) -> Result<AuthUser, AppError> {
    let token = authorization
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::auth(AUTHORIZATION_REQUIRED))?;

    let claims = tokens.verify(token, TokenKind::Session).map_err(reject_token)?;
    Ok(AuthUser { email: claims.email })
}
