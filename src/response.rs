//! # Response Envelope
//!
//! Every handler answers with the same JSON shape:
//!
//! ```json
//! {
//!   "message": { "success": "Inventory item added successfully" },
//!   "data": { "inventory": { "id": 1, "item_name": "Milk" } },
//!   "error": null
//! }
//! ```
//!
//! The key wrapping `data` is declared by the call site (`ApiResponse::keyed`),
//! or omitted entirely (`ApiResponse::with_data`) when the payload is already a
//! keyed object such as a page of results.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{ser::SerializeMap, Serialize, Serializer};

/// Severity bucket shown to the client; exactly one field is populated.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
}

impl Message {
    /// Pick the bucket for a status code: 2xx succeed, 400/404 warn, the rest are danger.
    pub fn for_status(status: StatusCode, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        if status.is_success() {
            Self { success: text, ..Default::default() }
        } else if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            Self { warning: text, ..Default::default() }
        } else {
            Self { danger: text, ..Default::default() }
        }
    }
}

/// Payload placed under `data`.
#[derive(Debug)]
pub enum Data<T> {
    Plain(T),
    Keyed(&'static str, T),
}

impl<T: Serialize> Serialize for Data<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Plain(value) => value.serialize(serializer),
            Data::Keyed(key, value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(key, value)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    message: Message,
    data: Option<Data<T>>,
    error: Option<BTreeMap<String, String>>,
}

impl ApiResponse<()> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: Message::for_status(StatusCode::OK, message),
            data: None,
            error: None,
        }
    }

    /// Failure response carrying a field-keyed error map.
    pub fn failure(
        status: StatusCode,
        message: impl Into<String>,
        errors: BTreeMap<String, String>,
    ) -> Self {
        Self {
            status,
            message: Message::for_status(status, message),
            data: None,
            error: Some(errors),
        }
    }

    /// Attach a payload that is serialized as-is under `data`.
    pub fn with_data<T: Serialize>(self, data: T) -> ApiResponse<T> {
        ApiResponse {
            status: self.status,
            message: self.message,
            data: Some(Data::Plain(data)),
            error: self.error,
        }
    }

    /// Attach a payload wrapped as `{ key: payload }` under `data`.
    pub fn keyed<T: Serialize>(self, key: &'static str, data: T) -> ApiResponse<T> {
        ApiResponse {
            status: self.status,
            message: self.message,
            data: Some(Data::Keyed(key, data)),
            error: self.error,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
