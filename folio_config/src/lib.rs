use std::{net::IpAddr, path::Path};

use anyhow::Context;
use config::{Environment, File, FileFormat};
use folio_models::{
    email_address::{EmailAddress, EmailAddressWithName},
    Sensitive,
};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

/// The default configuration, compiled into the binary.
pub const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml"));

/// Environment variable with a list of additional config files.
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";

/// Loads the default configuration, then the files listed in `FOLIO_CONFIG`
/// and finally `FOLIO_<SECTION>__<KEY>` environment variables.
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var_os(CONFIG_PATH_ENV)
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    builder(&paths, &[])?
        .add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("http.cors_origins"),
        )
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

/// Loads the default configuration, the given files and inline toml
/// overrides, ignoring the environment.
pub fn load_with_overrides(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    builder(paths, overrides)?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

fn builder(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let builder = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    let builder = paths.iter().try_fold(builder, |builder, path| {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        anyhow::Ok(builder.add_source(File::from_str(&content, FileFormat::Toml)))
    })?;

    Ok(overrides.iter().fold(builder, |builder, source| {
        builder.add_source(File::from_str(source, FileFormat::Toml))
    }))
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub rate_limit: RateLimitConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Settings that prevent contact messages from being delivered reliably.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self
            .email
            .api_key
            .as_ref()
            .map_or(true, |key| key.trim().is_empty())
        {
            problems.push("email.api_key is not set (FOLIO_EMAIL__API_KEY)");
        }
        if self.contact.email.is_none() {
            problems.push("contact.email is not set (FOLIO_CONTACT__EMAIL)");
        }
        if *self.contact.send_deadline >= *self.client.timeout {
            problems.push("contact.send_deadline must be shorter than client.timeout");
        }
        problems
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub real_ip: Option<RealIpConfig>,
    /// Origins allowed to call the api. Any origin is allowed if empty.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general: RateLimitPolicyConfig,
    pub contact: RateLimitPolicyConfig,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitPolicyConfig {
    pub window: Duration,
    pub limit: u64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<Sensitive<String>>,
    pub from: EmailAddressWithName,
    pub timeout: Duration,
    pub endpoint_override: Option<Url>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub email: Option<EmailAddress>,
    pub send_retries: u32,
    pub retry_backoff: Duration,
    /// Upper bound for all delivery attempts of one message.
    pub send_deadline: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub api_url: Url,
    pub timeout: Duration,
    pub success_display: Duration,
    pub fallback_delay: Duration,
}
