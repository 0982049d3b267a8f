//! # Authentication Module
//!
//! Passwordless sign-in: a short-lived magic link is emailed, redeemed once
//! for a session token, and the session token guards the API.

pub mod flow;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{TokenKind, TokenService, TokenTtls};
pub use middleware::AuthMiddleware;
pub use models::AuthUser;
