use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use folio_models::{
    contact::{ContactForm, ValidationErrors},
    email_address::EmailAddress,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    api::{ContactApi, ContactApiError},
    fallback::mailto_link,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Everything a contact form needs to render its feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub status: SubmissionStatus,
    pub error: Option<String>,
    pub success_message: Option<String>,
    /// A `mailto:` link, revealed some time after a failed submission.
    pub fallback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubmissionControllerConfig {
    /// Recipient of the fallback link.
    pub recipient: EmailAddress,
    /// How long the confirmation is shown before returning to idle.
    pub success_display: Duration,
    /// Delay between a failure and revealing the fallback link.
    pub fallback_delay: Duration,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in flight.")]
    InFlight,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ContactApiError),
}

/// Drives a contact form through one api round trip per submit.
///
/// At most one submission is in flight at a time. Observers follow the
/// status through [`SubmissionController::subscribe`].
#[derive(Debug)]
pub struct SubmissionController<Api> {
    api: Api,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    config: SubmissionControllerConfig,
    form: Mutex<ContactForm>,
    state: watch::Sender<SubmissionState>,
    /// Incremented by every submit, so timers of older submissions expire.
    generation: AtomicU64,
}

impl<Api: ContactApi> SubmissionController<Api> {
    pub fn new(api: Api, config: SubmissionControllerConfig) -> Self {
        Self {
            api,
            shared: Arc::new(Shared {
                config,
                form: Default::default(),
                state: watch::Sender::new(SubmissionState::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.shared.state.borrow().clone()
    }

    pub fn form(&self) -> ContactForm {
        self.shared.form()
    }

    pub fn update_form(&self, f: impl FnOnce(&mut ContactForm)) {
        if let Ok(mut form) = self.shared.form.lock() {
            f(&mut form);
        }
    }

    /// Returns to idle and drops any message or fallback link.
    pub fn reset(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.state.send_if_modified(|state| {
            if state.status == SubmissionStatus::Loading {
                return false;
            }
            *state = SubmissionState::default();
            true
        });
    }

    /// Validates and submits the current form.
    ///
    /// On success the form is cleared and the state returns to idle after
    /// the configured display time. On an api failure the fallback link is
    /// revealed after the configured delay. Local validation failures never
    /// reach the api.
    pub async fn submit(&self) -> Result<String, SubmitError> {
        let mut started = false;
        self.shared.state.send_if_modified(|state| {
            if state.status == SubmissionStatus::Loading {
                return false;
            }
            *state = SubmissionState {
                status: SubmissionStatus::Loading,
                ..Default::default()
            };
            started = true;
            true
        });
        if !started {
            return Err(SubmitError::InFlight);
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let form = self.form();

        if let Err(errors) = form.validate() {
            debug!("contact form is invalid: {errors}");
            self.shared.fail(errors.to_string());
            return Err(errors.into());
        }

        match self.api.send_contact_form(&form).await {
            Ok(message) => {
                self.update_form(|form| *form = ContactForm::default());
                self.shared.state.send_replace(SubmissionState {
                    status: SubmissionStatus::Succeeded,
                    success_message: Some(message.clone()),
                    ..Default::default()
                });
                Arc::clone(&self.shared).revert_after_success(generation);
                Ok(message)
            }
            Err(err) => {
                warn!("contact form submission failed: {err}");
                self.shared.fail(err.to_string());
                Arc::clone(&self.shared).reveal_fallback(generation);
                Err(err.into())
            }
        }
    }
}

impl Shared {
    fn form(&self) -> ContactForm {
        self.form.lock().map(|x| x.clone()).unwrap_or_default()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn fail(&self, error: String) {
        self.state.send_replace(SubmissionState {
            status: SubmissionStatus::Failed,
            error: Some(error),
            ..Default::default()
        });
    }

    fn revert_after_success(self: Arc<Self>, generation: u64) {
        tokio::spawn(async move {
            tokio::time::sleep(self.config.success_display).await;
            if self.is_current(generation) {
                self.state.send_if_modified(|state| {
                    if state.status != SubmissionStatus::Succeeded {
                        return false;
                    }
                    *state = SubmissionState::default();
                    true
                });
            }
        });
    }

    fn reveal_fallback(self: Arc<Self>, generation: u64) {
        tokio::spawn(async move {
            tokio::time::sleep(self.config.fallback_delay).await;
            if !self.is_current(generation) {
                return;
            }
            let link = mailto_link(&self.config.recipient, &self.form());
            self.state.send_if_modified(|state| {
                if state.status != SubmissionStatus::Failed {
                    return false;
                }
                state.fallback = Some(link);
                true
            });
        });
    }
}
