use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;

use crate::{Error, ErrorKind};

/// Implements conversion into json response for all possible error variants.
///
/// # Error message stripping
///
/// Only input errors are echoed back. Everything else is logged with its
/// full context and answered with a generic message, so storage and
/// upstream details never reach the page.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self.kind {
            ErrorKind::BadInput(msg) => {
                tracing::debug!("{}", self);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ErrorKind::NotFound(what) => {
                tracing::debug!("{}", self);
                (StatusCode::NOT_FOUND, format!("not found: {what}"))
            }
            ErrorKind::Generation(_) | ErrorKind::ReqwestError(_) => {
                tracing::warn!("{}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "the AI couldn't create this time, please try again".to_string(),
                )
            }
            ErrorKind::NotConfigured | ErrorKind::Connection(_) => {
                tracing::warn!("{}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage is unavailable".to_string(),
                )
            }
            _ => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "unexpected error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
