//! Magic-link routes: request a link, redeem it for a session token.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::{get, post},
};

use crate::auth::flow;
use crate::auth::models::{MagicLinkQuery, SubmitEmailRequest, TokenResponse};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::server::AppState;

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/submit-email", post(submit_email))
        .route("/auth/magic-link", get(magic_link))
}

/// `POST /auth/submit-email`
pub async fn submit_email(
    State(state): State<AppState>,
    payload: Result<Json<SubmitEmailRequest>, JsonRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let Json(request) = payload?;
    flow::submit(&state.tokens, state.mailer.as_ref(), &state.frontend_url, &request.email).await?;
    Ok(ApiResponse::ok("Magic link sent"))
}

/// `GET /auth/magic-link?token=`
pub async fn magic_link(
    State(state): State<AppState>,
    query: Result<Query<MagicLinkQuery>, QueryRejection>,
) -> Result<ApiResponse<TokenResponse>, AppError> {
    let Query(query) = query?;
    let token = query.token.unwrap_or_default();

    let access_token = flow::redeem(&state.tokens, state.store.as_ref(), &token).await?;
    Ok(ApiResponse::ok("Authentication successful").with_data(TokenResponse { access_token }))
}
