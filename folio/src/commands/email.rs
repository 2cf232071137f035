use clap::Subcommand;
use folio_config::Config;
use folio_email_contracts::{Email, EmailService};
use folio_models::email_address::EmailAddress;
use tracing::info;

use crate::environment;

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddress },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => test(config, recipient).await,
        }
    }
}

async fn test(config: Config, recipient: EmailAddress) -> anyhow::Result<()> {
    let email_service = environment::email_service(&config.email)?;

    info!("Sending test email to {recipient}");
    email_service
        .send(Email {
            recipient,
            reply_to: None,
            subject: "Email Deliverability Test".into(),
            text_body: "Email deliverability seems to be working!".into(),
            html_body: None,
        })
        .await?;

    println!("Test email was accepted by the provider.");

    Ok(())
}
