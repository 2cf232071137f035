use std::time::Duration;

use anyhow::anyhow;
use folio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::{contact::ContactSubmission, email_address::EmailAddress};
use folio_templates_contracts::{ContactEmailTemplate, TemplateService};
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<Email, Template> {
    email: Email,
    template: Template,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    /// Where submissions are delivered to.
    pub email: Option<EmailAddress>,
    /// How often a transient delivery failure is retried.
    pub send_retries: u32,
    /// Delay before the first retry, doubled for every further attempt.
    pub retry_backoff: Duration,
    /// Upper bound for all delivery attempts of one message, including the
    /// backoff in between. Must stay below the client's request timeout.
    pub send_deadline: Duration,
}

impl<EmailS, TemplateS> ContactFeatureServiceImpl<EmailS, TemplateS> {
    pub fn new(email: EmailS, template: TemplateS, config: ContactFeatureConfig) -> Self {
        Self {
            email,
            template,
            config,
        }
    }
}

impl<EmailS, TemplateS> ContactFeatureService for ContactFeatureServiceImpl<EmailS, TemplateS>
where
    EmailS: EmailService,
    TemplateS: TemplateService,
{
    #[tracing::instrument(skip_all, fields(from = %submission.email))]
    async fn send_message(
        &self,
        submission: ContactSubmission,
    ) -> Result<(), ContactSendMessageError> {
        let Some(recipient) = self.config.email.clone() else {
            error!("No destination address configured for contact messages");
            return Err(ContactSendMessageError::Configuration);
        };

        let html_body = self.template.render(&ContactEmailTemplate {
            name: submission.name.clone().into_inner(),
            email: submission.email.to_string(),
            subject: submission.subject.clone().into_inner(),
            message: submission.message.clone().into_inner(),
        })?;

        let email = Email {
            recipient,
            reply_to: Some(submission.author()),
            subject: submission.subject.into_inner(),
            text_body: format!(
                "Name: {}\nEmail: {}\n\nMessage: {}",
                *submission.name, submission.email, *submission.message
            ),
            html_body: Some(html_body),
        };

        let deadline = Instant::now() + self.config.send_deadline;
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;
        loop {
            let result = tokio::time::timeout_at(deadline, self.email.send(email.clone()))
                .await
                .unwrap_or_else(|_| {
                    Err(EmailSendError::Transport(anyhow!(
                        "Email delivery did not finish within {:?}",
                        self.config.send_deadline
                    )))
                });
            let err = match result {
                Ok(()) => {
                    info!("Contact message delivered");
                    return Ok(());
                }
                Err(err) => err,
            };

            if !err.is_transient()
                || attempt >= self.config.send_retries
                || Instant::now() + backoff >= deadline
            {
                error!("Failed to deliver contact message: {err}");
                return Err(err.into_contact_error());
            }

            attempt += 1;
            warn!("Delivery attempt {attempt} failed, retrying in {backoff:?}: {err}");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }

    fn is_configured(&self) -> bool {
        self.config.email.is_some() && self.email.is_configured()
    }
}

trait IntoContactError {
    fn into_contact_error(self) -> ContactSendMessageError;
}

impl IntoContactError for EmailSendError {
    fn into_contact_error(self) -> ContactSendMessageError {
        match self {
            Self::NotConfigured => ContactSendMessageError::Configuration,
            Self::Unauthorized => ContactSendMessageError::Authentication,
            Self::Forbidden(_) => ContactSendMessageError::Permission,
            Self::InvalidRecipient(_) => ContactSendMessageError::Recipient,
            Self::Rejected(message) => ContactSendMessageError::ProviderValidation(message),
            Self::Unavailable(status) => {
                anyhow!("Email provider unavailable (status {status})").into()
            }
            Self::Transport(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use folio_demo::{CONTACT_ADDRESS, JANE, MAX};
    use folio_email_contracts::MockEmailService;
    use folio_templates_contracts::MockTemplateService;
    use folio_utils::assert_matches;

    use super::*;

    const HTML: &str = "<p>rendered</p>";

    #[tokio::test]
    async fn ok() {
        // Arrange
        let email = MockEmailService::new().with_send(expected_email(&JANE.submission), Ok(()));
        let sut = make_sut(email, &JANE.submission);

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        result.unwrap();
    }

    #[test]
    fn text_body() {
        let email = expected_email(&MAX.submission);
        assert_eq!(
            email.text_body,
            "Name: Max Mustermann\nEmail: max.mustermann@example.de\n\nMessage: Would you like \
             to give a talk at our <b>meetup</b> next month?"
        );
        assert_eq!(email.subject, "Speaking <invitation> & more");
        let reply_to = email.reply_to.unwrap();
        assert_eq!(reply_to.name(), Some("Max Mustermann"));
        assert_eq!(reply_to.email(), "max.mustermann@example.de");
    }

    #[tokio::test]
    async fn no_destination() {
        // Arrange
        let sut = ContactFeatureServiceImpl::new(
            MockEmailService::new(),
            MockTemplateService::new(),
            ContactFeatureConfig {
                email: None,
                ..config()
            },
        );

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Configuration));
    }

    #[tokio::test]
    async fn provider_not_configured() {
        // Arrange
        let email = MockEmailService::new().with_send(
            expected_email(&JANE.submission),
            Err(EmailSendError::NotConfigured),
        );
        let sut = make_sut(email, &JANE.submission);

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Configuration));
    }

    #[tokio::test]
    async fn provider_errors_are_classified() {
        let cases = [
            (EmailSendError::Unauthorized, "Authentication"),
            (EmailSendError::Forbidden("sender".into()), "Permission"),
            (EmailSendError::InvalidRecipient("to".into()), "Recipient"),
            (EmailSendError::Rejected("content".into()), "ProviderValidation"),
        ];

        for (err, expected) in cases {
            // Arrange
            let email = MockEmailService::new().with_send(expected_email(&JANE.submission), Err(err));
            let sut = make_sut(email, &JANE.submission);

            // Act
            let result = sut.send_message(JANE.submission.clone()).await;

            // Assert
            let actual = match result {
                Err(ContactSendMessageError::Authentication) => "Authentication",
                Err(ContactSendMessageError::Permission) => "Permission",
                Err(ContactSendMessageError::Recipient) => "Recipient",
                Err(ContactSendMessageError::ProviderValidation(msg)) => {
                    assert_eq!(msg, "content");
                    "ProviderValidation"
                }
                other => panic!("unexpected result {other:?}"),
            };
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_is_retried_with_backoff() {
        // Arrange
        let email = MockEmailService::new().with_send_sequence(
            expected_email(&JANE.submission),
            [
                Err(EmailSendError::Unavailable(503)),
                Err(EmailSendError::Transport(anyhow!("connection reset"))),
                Ok(()),
            ],
        );
        let sut = make_sut(email, &JANE.submission);
        let start = Instant::now();

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        result.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        // Arrange
        let email = MockEmailService::new().with_send_sequence(
            expected_email(&JANE.submission),
            [
                Err(EmailSendError::Unavailable(503)),
                Err(EmailSendError::Unavailable(502)),
                Err(EmailSendError::Unavailable(500)),
            ],
        );
        let sut = make_sut(email, &JANE.submission);

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Other(err)) if err.to_string().contains("500"));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_not_retried() {
        // Arrange
        let email = MockEmailService::new()
            .with_send(expected_email(&JANE.submission), Err(EmailSendError::Unauthorized));
        let sut = make_sut(email, &JANE.submission);
        let start = Instant::now();

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Authentication));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_is_cut_off_at_deadline() {
        // Arrange
        let mut email = MockEmailService::new();
        email
            .expect_send()
            .once()
            .with(mockall::predicate::eq(expected_email(&JANE.submission)))
            .returning(|_| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                })
            });
        let sut = make_sut(email, &JANE.submission);
        let start = Instant::now();

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Other(err)) if err.to_string().contains("did not finish"));
        assert_eq!(start.elapsed(), config().send_deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_is_skipped_when_backoff_exceeds_deadline() {
        // Arrange
        let email = MockEmailService::new().with_send_sequence(
            expected_email(&JANE.submission),
            [
                Err(EmailSendError::Unavailable(503)),
                Err(EmailSendError::Unavailable(502)),
            ],
        );
        let template = MockTemplateService::new()
            .with_render(expected_template(&JANE.submission), Ok(HTML.into()));
        let sut = ContactFeatureServiceImpl::new(
            email,
            template,
            ContactFeatureConfig {
                send_deadline: Duration::from_millis(2500),
                ..config()
            },
        );
        let start = Instant::now();

        // Act
        let result = sut.send_message(JANE.submission.clone()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Other(err)) if err.to_string().contains("502"));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn is_configured() {
        let make = |destination: Option<EmailAddress>, provider: bool| {
            ContactFeatureServiceImpl::new(
                MockEmailService::new().with_is_configured(provider),
                MockTemplateService::new(),
                ContactFeatureConfig {
                    email: destination,
                    ..config()
                },
            )
        };

        assert!(make(Some(CONTACT_ADDRESS.clone()), true).is_configured());
        assert!(!make(Some(CONTACT_ADDRESS.clone()), false).is_configured());
        assert!(!make(None, true).is_configured());
    }

    fn config() -> ContactFeatureConfig {
        ContactFeatureConfig {
            email: Some(CONTACT_ADDRESS.clone()),
            send_retries: 2,
            retry_backoff: Duration::from_secs(1),
            send_deadline: Duration::from_secs(8),
        }
    }

    fn make_sut(
        email: MockEmailService,
        submission: &ContactSubmission,
    ) -> ContactFeatureServiceImpl<MockEmailService, MockTemplateService> {
        let template = MockTemplateService::new()
            .with_render(expected_template(submission), Ok(HTML.into()));
        ContactFeatureServiceImpl::new(email, template, config())
    }

    fn expected_template(submission: &ContactSubmission) -> ContactEmailTemplate {
        ContactEmailTemplate {
            name: submission.name.clone().into_inner(),
            email: submission.email.to_string(),
            subject: submission.subject.clone().into_inner(),
            message: submission.message.clone().into_inner(),
        }
    }

    fn expected_email(submission: &ContactSubmission) -> Email {
        Email {
            recipient: CONTACT_ADDRESS.clone(),
            reply_to: Some(submission.author()),
            subject: submission.subject.clone().into_inner(),
            text_body: format!(
                "Name: {}\nEmail: {}\n\nMessage: {}",
                *submission.name, submission.email, *submission.message
            ),
            html_body: Some(HTML.into()),
        }
    }
}
