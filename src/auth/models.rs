//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.

use serde::{Deserialize, Serialize};

/// Authenticated user information extracted from a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
}

/// `POST /auth/submit-email` payload
#[derive(Debug, Deserialize)]
pub struct SubmitEmailRequest {
    pub email: String,
}

/// `GET /auth/magic-link` query
#[derive(Debug, Deserialize)]
pub struct MagicLinkQuery {
    pub token: Option<String>,
}

/// Session token returned after a successful redemption
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}
