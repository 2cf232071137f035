use anyhow::{bail, Context};
use clap::Subcommand;
use folio_client::{
    api::ContactApiClient,
    controller::{SubmissionController, SubmissionControllerConfig, SubmitError},
};
use folio_config::Config;
use folio_models::{contact::ContactForm, email_address::EmailAddress};
use url::Url;

#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    /// Submit a message through the contact api
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        subject: Option<String>,
        /// Base url of the api, defaults to `client.api_url`
        #[arg(long)]
        api_url: Option<Url>,
        /// Recipient of the mailto fallback, defaults to `contact.email`
        #[arg(long)]
        fallback_recipient: Option<EmailAddress>,
    },
}

impl ContactCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            ContactCommand::Send {
                name,
                email,
                message,
                subject,
                api_url,
                fallback_recipient,
            } => {
                let form = ContactForm {
                    subject,
                    ..ContactForm::new(name, email, message)
                };
                send(config, form, api_url, fallback_recipient).await
            }
        }
    }
}

async fn send(
    config: Config,
    form: ContactForm,
    api_url: Option<Url>,
    fallback_recipient: Option<EmailAddress>,
) -> anyhow::Result<()> {
    let recipient = fallback_recipient
        .or(config.contact.email)
        .context("No fallback recipient, set contact.email or pass --fallback-recipient")?;

    let api_url = api_url.unwrap_or(config.client.api_url);
    let api = ContactApiClient::new(&api_url, *config.client.timeout)?;
    let controller = SubmissionController::new(
        api,
        SubmissionControllerConfig {
            recipient,
            success_display: *config.client.success_display,
            fallback_delay: *config.client.fallback_delay,
        },
    );
    controller.update_form(|x| *x = form);

    match controller.submit().await {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(SubmitError::Api(err)) => {
            eprintln!("{err}");
            let mut updates = controller.subscribe();
            let state = updates
                .wait_for(|state| state.fallback.is_some())
                .await
                .context("Submission state was dropped")?;
            if let Some(fallback) = &state.fallback {
                eprintln!("You can still send your message by email: {fallback}");
            }
            bail!("Failed to send message");
        }
        Err(err) => Err(err.into()),
    }
}
