use std::future::Future;

use folio_models::contact::ContactSubmission;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Forwards a validated submission to the site owner.
    fn send_message(
        &self,
        submission: ContactSubmission,
    ) -> impl Future<Output = Result<(), ContactSendMessageError>> + Send;

    /// Whether both a destination address and a mail provider are
    /// configured.
    fn is_configured(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum ContactSendMessageError {
    #[error("Email delivery is not configured.")]
    Configuration,
    #[error("The email provider rejected the credentials.")]
    Authentication,
    #[error("The email provider denied permission to send.")]
    Permission,
    #[error("The destination address was rejected.")]
    Recipient,
    #[error("The email provider rejected the message: {0}")]
    ProviderValidation(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_send_message(
        mut self,
        submission: ContactSubmission,
        result: Result<(), ContactSendMessageError>,
    ) -> Self {
        self.expect_send_message()
            .once()
            .with(mockall::predicate::eq(submission))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }

    pub fn with_is_configured(mut self, configured: bool) -> Self {
        self.expect_is_configured().return_const(configured);
        self
    }
}
