use std::{future::Future, time::Duration};

use anyhow::Context;
use folio_models::contact::ContactForm;
use folio_utils::folio_version;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_SEND_FAILED: &str = "Failed to send message";
pub const NETWORK_ERROR: &str =
    "Could not reach the server. Please check your connection and try again.";
const DEFAULT_SUCCESS: &str = "Message sent successfully";

#[cfg_attr(test, mockall::automock)]
pub trait ContactApi: Send + Sync + 'static {
    /// Submits the form and returns the confirmation message of the server.
    fn send_contact_form(
        &self,
        form: &ContactForm,
    ) -> impl Future<Output = Result<String, ContactApiError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactApiError {
    /// The server rejected one or more fields.
    #[error("{0}")]
    Validation(String),
    /// The server answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the server. Please check your connection and try again.")]
    Network(#[source] reqwest::Error),
}

/// [`ContactApi`] talking to the REST api over HTTP.
#[derive(Debug, Clone)]
pub struct ContactApiClient {
    client: reqwest::Client,
    contact_endpoint: Url,
}

impl ContactApiClient {
    /// `base_url` is the api root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: &Url, timeout: Duration) -> anyhow::Result<Self> {
        let contact_endpoint = format!("{}/contact", base_url.as_str().trim_end_matches('/'))
            .parse()
            .context("Invalid api url")?;
        let client = reqwest::Client::builder()
            .user_agent(format!("folio-client/{}", folio_version()))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            contact_endpoint,
        })
    }
}

impl ContactApi for ContactApiClient {
    async fn send_contact_form(&self, form: &ContactForm) -> Result<String, ContactApiError> {
        let response = self
            .client
            .post(self.contact_endpoint.clone())
            .json(form)
            .send()
            .await
            .map_err(ContactApiError::Network)?;

        let status = response.status();
        let body = response.json::<ResponseBody>().await.unwrap_or_else(|err| {
            debug!(%status, "failed to parse response body: {err}");
            ResponseBody::default()
        });

        if status.is_success() {
            return Ok(body.message.unwrap_or_else(|| DEFAULT_SUCCESS.into()));
        }

        Err(body.into_error(status.as_u16()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ResponseBody {
    message: Option<String>,
    errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Deserialize)]
struct FieldError {
    msg: String,
}

impl ResponseBody {
    fn into_error(self, status: u16) -> ContactApiError {
        match self.errors.filter(|errors| !errors.is_empty()) {
            Some(errors) => ContactApiError::Validation(
                errors
                    .into_iter()
                    .map(|x| x.msg)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            None => ContactApiError::Rejected {
                status,
                message: self
                    .message
                    .filter(|x| !x.is_empty())
                    .unwrap_or_else(|| DEFAULT_SEND_FAILED.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use axum::{http::StatusCode, routing, Json, Router};
    use folio_demo::JANE;
    use folio_utils::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves `POST /api/contact` with a fixed response.
    async fn serve(status: StatusCode, body: Value) -> Url {
        let router = Router::new().route(
            "/api/contact",
            routing::post(move |Json(_): Json<Value>| async move { (status, Json(body)) }),
        );
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{addr}/api").parse().unwrap()
    }

    fn make_sut(base_url: &Url) -> ContactApiClient {
        ContactApiClient::new(base_url, Duration::from_secs(10)).unwrap()
    }

    #[tokio::test]
    async fn ok() {
        let url = serve(
            StatusCode::OK,
            json!({"message": "Message sent successfully! Thank you.", "success": true}),
        )
        .await;

        let result = make_sut(&url).send_contact_form(&JANE.form).await;

        assert_eq!(result.unwrap(), "Message sent successfully! Thank you.");
    }

    #[tokio::test]
    async fn validation_errors_are_joined() {
        let url = serve(
            StatusCode::BAD_REQUEST,
            json!({
                "message": "Validation failed",
                "errors": [
                    {"msg": "Name is required", "path": "name", "location": "body"},
                    {"msg": "Valid email is required", "path": "email", "location": "body"},
                ],
            }),
        )
        .await;

        let result = make_sut(&url).send_contact_form(&JANE.form).await;

        assert_matches!(result, Err(ContactApiError::Validation(msg)) if msg == "Name is required, Valid email is required");
    }

    #[tokio::test]
    async fn server_message() {
        let url = serve(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"message": "Too many contact requests from this IP, please try again after an hour"}),
        )
        .await;

        let result = make_sut(&url).send_contact_form(&JANE.form).await;

        assert_matches!(
            result,
            Err(ContactApiError::Rejected { status: 429, message }) if message.contains("after an hour")
        );
    }

    #[tokio::test]
    async fn default_message() {
        let url = serve(StatusCode::INTERNAL_SERVER_ERROR, Value::Null).await;

        let result = make_sut(&url).send_contact_form(&JANE.form).await;

        assert_eq!(result.unwrap_err().to_string(), DEFAULT_SEND_FAILED);
    }

    #[tokio::test]
    async fn network_error() {
        let url = "http://127.0.0.1:1/api".parse().unwrap();

        let result = make_sut(&url).send_contact_form(&JANE.form).await;

        assert_matches!(result, Err(err @ ContactApiError::Network(_)) if err.to_string() == NETWORK_ERROR);
    }

    #[test]
    fn trailing_slash_in_base_url() {
        let sut = make_sut(&"http://localhost:3001/api/".parse().unwrap());
        assert_eq!(sut.contact_endpoint.as_str(), "http://localhost:3001/api/contact");
    }
}
