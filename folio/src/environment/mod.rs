//! Wiring of the concrete services from the configuration.

use anyhow::Context;
use axum::http::HeaderValue;
use folio_api_rest::{RateLimitRule, RateLimitRules, RealIpConfig, RestServerConfig};
use folio_config::{Config, EmailConfig, RateLimitPolicyConfig};
use folio_core_contact_impl::ContactFeatureConfig;
use folio_email_impl::SendGridEmailServiceConfig;
use folio_shared_contracts::rate_limit::RateLimitPolicy;

use self::types::{ContactFeature, Email, HealthFeature, RateLimit, RestServer, Template, Time};

pub mod types;

pub fn email_service(config: &EmailConfig) -> anyhow::Result<Email> {
    let sendgrid_config = SendGridEmailServiceConfig::new(
        config.api_key.clone().map(|key| key.0),
        config.from.clone(),
        config.endpoint_override.clone(),
    );
    Email::new(sendgrid_config, *config.timeout).context("Failed to create email service")
}

pub fn contact_feature(config: &Config) -> anyhow::Result<ContactFeature> {
    Ok(ContactFeature::new(
        email_service(&config.email)?,
        Template::new()?,
        ContactFeatureConfig {
            email: config.contact.email.clone(),
            send_retries: config.contact.send_retries,
            retry_backoff: *config.contact.retry_backoff,
            send_deadline: *config.contact.send_deadline,
        },
    ))
}

pub fn rest_server(config: &Config) -> anyhow::Result<RestServer> {
    let contact = contact_feature(config)?;
    let health = HealthFeature::new(Time::default(), contact.clone());
    let rate_limit = RateLimit::new(Time::default());

    let cors_origins: Vec<HeaderValue> = config
        .http
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .with_context(|| format!("Invalid cors origin {origin:?}"))
        })
        .collect::<anyhow::Result<_>>()?;

    let rate_limit_rules = config.rate_limit.enabled.then(|| RateLimitRules {
        general: rule("general", &config.rate_limit.general),
        contact: rule("contact", &config.rate_limit.contact),
    });

    let server_config = RestServerConfig {
        host: config.http.host,
        port: config.http.port,
        real_ip: config.http.real_ip.as_ref().map(|real_ip| RealIpConfig {
            header: real_ip.header.clone(),
            set_from: real_ip.set_from,
        }),
        cors_origins,
        rate_limit: rate_limit_rules,
    };

    Ok(RestServer::new(server_config, health, contact, rate_limit))
}

fn rule(name: &'static str, config: &RateLimitPolicyConfig) -> RateLimitRule {
    RateLimitRule {
        policy: RateLimitPolicy {
            name,
            limit: config.limit,
            window: *config.window,
        },
        message: config.message.clone(),
    }
}
