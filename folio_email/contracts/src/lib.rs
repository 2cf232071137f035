use std::future::Future;

use folio_models::email_address::{EmailAddress, EmailAddressWithName};
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Delivers the email with exactly one request to the provider.
    ///
    /// Retrying is left to the caller, see [`EmailSendError::is_transient`].
    fn send(&self, email: Email) -> impl Future<Output = Result<(), EmailSendError>> + Send;

    /// Whether the service has the credentials it needs to send anything.
    fn is_configured(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddress,
    pub reply_to: Option<EmailAddressWithName>,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    #[error("Email delivery is not configured.")]
    NotConfigured,
    #[error("The email provider rejected the api key.")]
    Unauthorized,
    #[error("The email provider denied access: {0}")]
    Forbidden(String),
    #[error("The email provider rejected the recipient: {0}")]
    InvalidRecipient(String),
    #[error("The email provider rejected the message: {0}")]
    Rejected(String),
    #[error("The email provider is unavailable (status {0}).")]
    Unavailable(u16),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl EmailSendError {
    /// Whether sending the same email again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Transport(_))
    }
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_send(mut self, email: Email, result: Result<(), EmailSendError>) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }

    /// Expects `email` to be sent once per item in `results`, returning them
    /// in order.
    pub fn with_send_sequence(
        mut self,
        email: Email,
        results: impl IntoIterator<Item = Result<(), EmailSendError>>,
    ) -> Self {
        let mut seq = mockall::Sequence::new();
        for result in results {
            self.expect_send()
                .once()
                .in_sequence(&mut seq)
                .with(mockall::predicate::eq(email.clone()))
                .return_once(move |_| Box::pin(std::future::ready(result)));
        }
        self
    }

    pub fn with_is_configured(mut self, configured: bool) -> Self {
        self.expect_is_configured().return_const(configured);
        self
    }
}
