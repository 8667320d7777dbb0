//! Response envelope shared by every endpoint.
//!
//! ```json
//! { "success": true, "data": { ... }, "error": null }
//! { "success": false, "data": null, "error": "invalid-input: ..." }
//! ```

use crate::governance::{GovernanceError, GovernanceResult};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(err: &GovernanceError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.public_message()),
        }
    }
}

/// Render a service result. Backend causes are logged here and never sent.
pub fn respond<T: Serialize>(success_status: StatusCode, result: GovernanceResult<T>) -> Response {
    match result {
        Ok(data) => (success_status, Json(Envelope::ok(data))).into_response(),
        Err(err) => failure(err),
    }
}

pub fn failure(err: GovernanceError) -> Response {
    if let GovernanceError::BackendUnavailable(cause) = &err {
        error!(%cause, "backend failure");
    }
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(Envelope::failure(&err))).into_response()
}
