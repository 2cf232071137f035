use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use folio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use folio_models::contact::ContactForm;
use folio_shared_contracts::rate_limit::RateLimitService;
use folio_utils::Apply;
use tracing::debug;

use crate::{
    errors::{error, internal_server_error, validation_failed, EMAIL_UNAVAILABLE, MESSAGE_FORMAT},
    middlewares,
    models::ApiSuccess,
    RateLimitRule,
};

pub const SUCCESS_MESSAGE: &str =
    "Message sent successfully! Thank you for contacting me. I'll get back to you soon.";

pub fn router<R: RateLimitService>(
    service: Arc<impl ContactFeatureService>,
    rate_limit: Option<(Arc<R>, RateLimitRule)>,
) -> Router<()> {
    let route = routing::post(send_message).apply_map(rate_limit, |route, (limiter, rule)| {
        middlewares::rate_limit::add_to_route(route, limiter, rule)
    });

    Router::new().route("/contact", route).with_state(service)
}

async fn send_message(
    service: State<Arc<impl ContactFeatureService>>,
    form: Result<Json<ContactForm>, JsonRejection>,
) -> Response {
    // Unreadable bodies are treated like a form with every field missing.
    let form = form
        .map(|Json(form)| form)
        .inspect_err(|err| debug!("rejected contact request body: {err}"))
        .unwrap_or_default();

    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(errors) => {
            debug!("contact form validation failed: {errors}");
            return validation_failed(&errors);
        }
    };

    match service.send_message(submission).await {
        Ok(()) => Json(ApiSuccess {
            message: SUCCESS_MESSAGE,
            success: true,
        })
        .into_response(),
        Err(ContactSendMessageError::Configuration) => error(
            StatusCode::SERVICE_UNAVAILABLE,
            EMAIL_UNAVAILABLE,
            "Email service configuration error",
        ),
        Err(ContactSendMessageError::Recipient) => error(
            StatusCode::SERVICE_UNAVAILABLE,
            EMAIL_UNAVAILABLE,
            "Invalid recipient email",
        ),
        Err(ContactSendMessageError::Authentication) => error(
            StatusCode::SERVICE_UNAVAILABLE,
            EMAIL_UNAVAILABLE,
            "Email service authentication failed",
        ),
        Err(ContactSendMessageError::Permission) => error(
            StatusCode::SERVICE_UNAVAILABLE,
            EMAIL_UNAVAILABLE,
            "Email service permission denied",
        ),
        Err(ContactSendMessageError::ProviderValidation(message)) => {
            error(StatusCode::BAD_REQUEST, MESSAGE_FORMAT, &message)
        }
        Err(ContactSendMessageError::Other(err)) => internal_server_error(err),
    }
}
