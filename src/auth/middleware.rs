//! Authentication Middleware
//!
//! Axum middleware guarding the inventory and recipe routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{flow, jwt::TokenService};
use crate::error::AppError;

/// Authentication middleware that validates session tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Reject the request unless it carries `Authorization: Bearer <session token>`.
    pub async fn validate_token(
        State(tokens): State<Arc<TokenService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let auth_user = flow::authenticate(&tokens, authorization).map_err(|e| {
            tracing::warn!("[AuthMiddleware] {} {} rejected", req.method(), req.uri().path());
            e
        })?;
        tracing::debug!("[AuthMiddleware] Authenticated {}", auth_user.email);

        // Handlers read the caller via `Extension<AuthUser>`
        req.extensions_mut().insert(auth_user);

        Ok(next.run(req).await)
    }
}
