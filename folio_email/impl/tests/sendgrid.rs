use std::time::Duration;

use folio_demo::{CONTACT_ADDRESS, FROM_ADDRESS, JANE, SENDGRID_API_KEY};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_email_impl::{SendGridEmailService, SendGridEmailServiceConfig};
use folio_testing::sendgrid::{self, Outbox};
use folio_utils::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn ok() {
    let (sut, outbox) = make_sut(SENDGRID_API_KEY).await;

    sut.send(email(CONTACT_ADDRESS.as_str(), "Hello")).await.unwrap();

    let messages = outbox.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0]["personalizations"],
        json!([{"to": [{"email": "owner@folio.example"}]}])
    );
    assert_eq!(
        messages[0]["reply_to"],
        json!({"email": "jane@example.com", "name": "Jane Doe"})
    );
}

#[tokio::test]
async fn wrong_api_key() {
    let (sut, outbox) = make_sut("SG.wrong").await;

    let result = sut.send(email(CONTACT_ADDRESS.as_str(), "Hello")).await;

    assert_matches!(result, Err(EmailSendError::Unauthorized));
    assert!(outbox.messages().is_empty());
}

#[tokio::test]
async fn forbidden() {
    let (sut, _) = make_sut(SENDGRID_API_KEY).await;

    let result = sut.send(email("owner@forbidden.example", "Hello")).await;

    assert_matches!(result, Err(EmailSendError::Forbidden(msg)) if msg.contains("Sender Identity"));
}

#[tokio::test]
async fn invalid_recipient() {
    let (sut, _) = make_sut(SENDGRID_API_KEY).await;

    let result = sut.send(email("invalid@folio.example", "Hello")).await;

    assert_matches!(result, Err(EmailSendError::InvalidRecipient(msg)) if msg == "Does not contain a valid address.");
}

#[tokio::test]
async fn rejected_content() {
    let (sut, _) = make_sut(SENDGRID_API_KEY).await;

    let result = sut.send(email(CONTACT_ADDRESS.as_str(), "[reject]")).await;

    assert_matches!(result, Err(EmailSendError::Rejected(_)));
}

#[tokio::test]
async fn unavailable_is_transient() {
    let (sut, _) = make_sut(SENDGRID_API_KEY).await;

    let result = sut
        .send(email(CONTACT_ADDRESS.as_str(), "[unavailable]"))
        .await;

    assert_matches!(result, Err(err @ EmailSendError::Unavailable(503)) if err.is_transient());
}

#[tokio::test]
async fn not_configured() {
    let config = SendGridEmailServiceConfig::new(None, FROM_ADDRESS.clone(), None);
    let sut = SendGridEmailService::new(config, Duration::from_secs(10)).unwrap();

    let result = sut.send(email(CONTACT_ADDRESS.as_str(), "Hello")).await;

    assert!(!sut.is_configured());
    assert_matches!(result, Err(EmailSendError::NotConfigured));
}

#[tokio::test]
async fn unreachable_provider_is_transient() {
    let config = SendGridEmailServiceConfig::new(
        Some(SENDGRID_API_KEY.into()),
        FROM_ADDRESS.clone(),
        Some("http://127.0.0.1:1/v3/mail/send".parse().unwrap()),
    );
    let sut = SendGridEmailService::new(config, Duration::from_secs(2)).unwrap();

    let result = sut.send(email(CONTACT_ADDRESS.as_str(), "Hello")).await;

    assert_matches!(result, Err(err @ EmailSendError::Transport(_)) if err.is_transient());
}

#[tokio::test]
async fn unexpected_status_is_transport_error() {
    let (endpoint, outbox) = sendgrid::spawn(SENDGRID_API_KEY).await.unwrap();
    let config = SendGridEmailServiceConfig::new(
        Some(SENDGRID_API_KEY.into()),
        FROM_ADDRESS.clone(),
        Some(endpoint.join("/v3/mail/wrong").unwrap()),
    );
    let sut = SendGridEmailService::new(config, Duration::from_secs(10)).unwrap();

    let result = sut.send(email(CONTACT_ADDRESS.as_str(), "Hello")).await;

    assert_matches!(result, Err(EmailSendError::Transport(err)) if err.to_string().contains("404"));
    assert!(outbox.messages().is_empty());
}

async fn make_sut(api_key: &str) -> (SendGridEmailService, Outbox) {
    let (endpoint, outbox) = sendgrid::spawn(SENDGRID_API_KEY).await.unwrap();
    let config = SendGridEmailServiceConfig::new(
        Some(api_key.into()),
        FROM_ADDRESS.clone(),
        Some(endpoint),
    );
    let sut = SendGridEmailService::new(config, Duration::from_secs(10)).unwrap();
    assert!(sut.is_configured());
    (sut, outbox)
}

fn email(recipient: &str, subject: &str) -> Email {
    Email {
        recipient: recipient.parse().unwrap(),
        reply_to: Some(JANE.submission.author()),
        subject: subject.into(),
        text_body: "Hello there".into(),
        html_body: None,
    }
}
