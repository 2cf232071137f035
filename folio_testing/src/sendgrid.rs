//! A minimal imitation of the SendGrid v3 mail send endpoint.
//!
//! Requests are answered based on their content:
//! - a wrong api key is rejected with `401`
//! - recipients at `forbidden.example` are rejected with `403`
//! - recipients with the local part `invalid` are rejected with `400`
//! - a subject containing `[reject]` is rejected with `400`
//! - a subject containing `[unavailable]` is answered with `503`
//!
//! Everything else is accepted with `202` and recorded in the [`Outbox`].

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

pub const SEND_ROUTE: &str = "/v3/mail/send";

/// Messages accepted by the testing server.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<Value>>>);

impl Outbox {
    pub fn messages(&self) -> Vec<Value> {
        self.0.lock().map(|x| x.clone()).unwrap_or_default()
    }

    fn push(&self, message: Value) {
        if let Ok(mut messages) = self.0.lock() {
            messages.push(message);
        }
    }
}

#[derive(Debug)]
struct SendGridState {
    api_key: String,
    outbox: Outbox,
}

pub async fn start_server(host: IpAddr, port: u16, api_key: String) -> anyhow::Result<()> {
    info!("Starting sendgrid testing server on {host}:{port}");
    info!("Mail send endpoint: http://{host}:{port}{SEND_ROUTE}");
    info!("Api key: {api_key:?}");

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(api_key, Outbox::default()))
        .await
        .context("Failed to start HTTP server")
}

/// Starts the testing server on a random local port in the background and
/// returns its mail send endpoint.
pub async fn spawn(api_key: impl Into<String>) -> anyhow::Result<(Url, Outbox)> {
    let outbox = Outbox::default();
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .context("Failed to bind to a random port")?;
    let addr = listener.local_addr()?;
    let router = router(api_key.into(), outbox.clone());
    tokio::spawn(async move { axum::serve(listener, router).await });

    let endpoint = format!("http://{addr}{SEND_ROUTE}").parse()?;
    Ok((endpoint, outbox))
}

pub fn router(api_key: String, outbox: Outbox) -> Router {
    Router::new()
        .route(SEND_ROUTE, routing::post(send))
        .with_state(SendGridState { api_key, outbox }.into())
}

async fn send(
    State(state): State<Arc<SendGridState>>,
    headers: HeaderMap,
    Json(message): Json<Value>,
) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    if headers
        .get(header::AUTHORIZATION)
        .map_or(true, |x| x.as_bytes() != expected.as_bytes())
    {
        return error(
            StatusCode::UNAUTHORIZED,
            "The provided authorization grant is invalid, expired, or revoked",
            None,
        );
    }

    let recipient = message["personalizations"][0]["to"][0]["email"]
        .as_str()
        .unwrap_or_default();
    let subject = message["subject"].as_str().unwrap_or_default();

    if recipient.ends_with("@forbidden.example") {
        error(
            StatusCode::FORBIDDEN,
            "The from address does not match a verified Sender Identity",
            None,
        )
    } else if recipient.is_empty() || recipient.starts_with("invalid@") {
        error(
            StatusCode::BAD_REQUEST,
            "Does not contain a valid address.",
            Some("personalizations.0.to.0.email"),
        )
    } else if subject.contains("[reject]") {
        error(
            StatusCode::BAD_REQUEST,
            "The content value must be a string at least one character in length.",
            Some("content.0.value"),
        )
    } else if subject.contains("[unavailable]") {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        state.outbox.push(message);
        StatusCode::ACCEPTED.into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    errors: Vec<ErrorDetail>,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: &'static str,
    field: Option<&'static str>,
    help: Option<&'static str>,
}

fn error(status: StatusCode, message: &'static str, field: Option<&'static str>) -> Response {
    let body = ErrorResponse {
        errors: vec![ErrorDetail {
            message,
            field,
            help: None,
        }],
    };
    (status, Json(body)).into_response()
}
