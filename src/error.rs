//! Application error type shared by every handler.
//!
//! Lower layers keep their own error enums (`StoreError`, `CostingError`,
//! `MailError`, `TokenError`); they are folded into `AppError` here so that
//! the HTTP status is always derived from the error kind.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::costing::CostingError;
use crate::database::StoreError;
use crate::mail::MailError;
use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: bad email, bad unit, bad JSON body
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// Missing, invalid, expired or reused token
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("email delivery failed: {0}")]
    Delivery(String),

    /// Server-side failure that touched no storage, e.g. token signing
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure attributed to a single field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.clone());
        Self::Validation { message, fields }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Delivery(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message and field-keyed error map.
    fn public_parts(&self) -> (String, BTreeMap<String, String>) {
        let single = |key: &str, text: String| {
            let mut map = BTreeMap::new();
            map.insert(key.to_string(), text.clone());
            (text, map)
        };

        match self {
            AppError::Validation { message, fields } => (message.clone(), fields.clone()),
            AppError::Auth(message) => single("token", message.clone()),
            AppError::NotFound(message) => single("not_found", message.clone()),
            // Store internals stay in the logs.
            AppError::Persistence(_) => single("db", "internal server error".to_string()),
            AppError::Delivery(_) => single("send_email", "failed to send email".to_string()),
            AppError::Internal(_) => single("internal", "internal server error".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Persistence(detail) => tracing::error!("Persistence error: {}", detail),
            AppError::Delivery(detail) => tracing::error!("Email delivery error: {}", detail),
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            AppError::Auth(message) => tracing::warn!("Unauthorized: {}", message),
            other => tracing::debug!("Request rejected ({}): {}", status, other),
        }

        let (message, errors) = self.public_parts();
        ApiResponse::failure(status, message, errors).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => AppError::not_found(format!("{} not found", entity)),
            StoreError::Conflict(field) => AppError::validation(field, format!("{} already exists", field)),
            StoreError::Backend(detail) => AppError::Persistence(detail),
        }
    }
}

impl From<CostingError> for AppError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::ItemNotFound(_) => AppError::not_found(err.to_string()),
            CostingError::InvalidUnit(_) => AppError::validation("unit", "invalid unit"),
            CostingError::ZeroQuantity(_) => AppError::validation("quantity", err.to_string()),
            CostingError::InvalidUnitsProduced(_) => AppError::validation("number_of_cups", err.to_string()),
            CostingError::Overflow(_) => AppError::validation("ingredients", err.to_string()),
            CostingError::Store(store) => store.into(),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::Delivery(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("binding", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation("id", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}
