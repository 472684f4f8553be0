//! API error responses
//!
//! Maps [`tender_common::Error`] onto HTTP statuses with a JSON body. The
//! three failure families behave differently: validation errors carry the
//! full field-level list, processing errors carry one terminal message,
//! and external-tool errors add a support hint since the user cannot fix
//! them by editing the request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tender_common::Error;
use tracing::{error, warn};

/// Error wrapper implementing IntoResponse for every handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "validation failed",
                    "details": errors,
                }),
            ),
            Error::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("not found: {}", what) }),
            ),
            Error::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg }),
            ),
            Error::InvalidEstimate(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": format!("invalid estimate: {}", msg) }),
            ),
            Error::Parse(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": format!("could not parse file: {}", msg) }),
            ),
            Error::Template(msg) | Error::ExternalTool(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": msg,
                    "hint": "try again or contact support",
                }),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": other.to_string() }),
            ),
        };

        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected: {}", self.0);
        }

        (status, Json(body)).into_response()
    }
}
