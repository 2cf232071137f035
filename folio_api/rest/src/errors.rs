use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_models::contact::ValidationErrors;

use crate::models::{ApiError, ApiValidationFailed};

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const EMAIL_UNAVAILABLE: &str =
    "Email service is temporarily unavailable. Please try contacting me directly via email.";
pub const MESSAGE_FORMAT: &str = "There was an issue with your message format. Please try again.";
pub const SEND_FAILED: &str =
    "Failed to send message. Please try contacting me directly via email.";

pub fn internal_server_error(err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    tracing::error!("internal server error: {err:#}");
    error(StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED, "Internal server error")
}

pub fn error(code: StatusCode, message: &str, error: &str) -> Response {
    (code, Json(ApiError { message, error })).into_response()
}

pub fn validation_failed(errors: &ValidationErrors) -> Response {
    let body = ApiValidationFailed {
        message: VALIDATION_FAILED,
        errors: errors.violations().iter().map(Into::into).collect(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

