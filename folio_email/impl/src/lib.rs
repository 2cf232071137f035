use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::{email_address::EmailAddressWithName, Sensitive};
use folio_utils::Apply;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::http::HttpClient;

pub mod http;

const SEND_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Delivers emails through the SendGrid v3 mail send api.
#[derive(Debug, Clone)]
pub struct SendGridEmailService {
    config: Arc<SendGridEmailServiceConfig>,
    client: HttpClient,
}

#[derive(Debug, Clone)]
pub struct SendGridEmailServiceConfig {
    pub endpoint: Url,
    pub api_key: Option<Sensitive<String>>,
    pub from: EmailAddressWithName,
}

impl SendGridEmailServiceConfig {
    pub fn new(
        api_key: Option<String>,
        from: EmailAddressWithName,
        endpoint_override: Option<Url>,
    ) -> Self {
        Self {
            endpoint: endpoint_override.unwrap_or_else(|| SEND_ENDPOINT.parse().unwrap()),
            api_key: api_key.filter(|x| !x.trim().is_empty()).map(Sensitive),
            from,
        }
    }
}

impl SendGridEmailService {
    pub fn new(config: SendGridEmailServiceConfig, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.into(),
            client: HttpClient::new(timeout)?,
        })
    }
}

impl EmailService for SendGridEmailService {
    #[tracing::instrument(skip_all, fields(recipient = %email.recipient))]
    async fn send(&self, email: Email) -> Result<(), EmailSendError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(EmailSendError::NotConfigured);
        };

        let request = SendRequest::new(&self.config.from, &email);
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&**api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to sendgrid")?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "email accepted");
            return Ok(());
        }

        let error = classify(status, response).await;
        warn!(%status, error = %error, "sendgrid rejected email");
        Err(error)
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

async fn classify(status: StatusCode, response: Response) -> EmailSendError {
    match status {
        StatusCode::UNAUTHORIZED => return EmailSendError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => return EmailSendError::Unavailable(status.as_u16()),
        _ if status.is_server_error() => return EmailSendError::Unavailable(status.as_u16()),
        _ => {}
    }

    let errors = response
        .json::<ErrorResponse>()
        .await
        .map(|x| x.errors)
        .unwrap_or_default();
    let message = errors
        .iter()
        .map(|x| x.message.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    match status {
        StatusCode::FORBIDDEN if message.is_empty() => {
            EmailSendError::Forbidden(status.to_string())
        }
        StatusCode::FORBIDDEN => EmailSendError::Forbidden(message),
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNPROCESSABLE_ENTITY
            if !errors.is_empty() =>
        {
            if errors.iter().any(ErrorDetail::concerns_recipient) {
                EmailSendError::InvalidRecipient(message)
            } else {
                EmailSendError::Rejected(message)
            }
        }
        _ => EmailSendError::Transport(anyhow!("Unexpected sendgrid response: {status}")),
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Mailbox<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Mailbox<'a>>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Mailbox<'a>; 1],
}

#[derive(Serialize)]
struct Mailbox<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

impl<'a> SendRequest<'a> {
    fn new(from: &'a EmailAddressWithName, email: &'a Email) -> Self {
        Self {
            personalizations: [Personalization {
                to: [Mailbox {
                    email: email.recipient.as_str(),
                    name: None,
                }],
            }],
            from: from.into(),
            reply_to: email.reply_to.as_ref().map(Into::into),
            subject: &email.subject,
            content: vec![Content {
                content_type: "text/plain",
                value: &email.text_body,
            }]
            .apply_map(email.html_body.as_deref(), |mut content, html| {
                content.push(Content {
                    content_type: "text/html",
                    value: html,
                });
                content
            }),
        }
    }
}

impl<'a> From<&'a EmailAddressWithName> for Mailbox<'a> {
    fn from(value: &'a EmailAddressWithName) -> Self {
        Self {
            email: value.email(),
            name: value.name(),
        }
    }
}

#[derive(Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    field: Option<String>,
}

impl ErrorDetail {
    fn concerns_recipient(&self) -> bool {
        self.field.as_deref().is_some_and(|field| {
            field.starts_with("personalizations") && field.contains(".to")
        })
    }
}
