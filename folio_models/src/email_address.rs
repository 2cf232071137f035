use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress(pub lettre::Address);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressWithName(pub lettre::message::Mailbox);

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    pub fn with_name(self, name: String) -> EmailAddressWithName {
        EmailAddressWithName(lettre::message::Mailbox {
            name: Some(name),
            email: self.0,
        })
    }

    /// Parses an address typed by a user after trimming it and lowering its
    /// case. Unlike [`FromStr`], the domain must end in a top-level domain,
    /// so hosts like `localhost` are rejected.
    pub fn parse_normalized(s: &str) -> Result<Self, EmailAddressError> {
        let address = s.trim().to_lowercase().parse::<Self>()?;
        if !has_top_level_domain(address.0.domain()) {
            return Err(EmailAddressError::MissingTopLevelDomain);
        }
        Ok(address)
    }
}

#[derive(Debug, Error)]
pub enum EmailAddressError {
    #[error(transparent)]
    Invalid(#[from] lettre::address::AddressError),
    #[error("Email address has no top-level domain")]
    MissingTopLevelDomain,
}

fn has_top_level_domain(domain: &str) -> bool {
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && (tld.starts_with("xn--")
            || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())))
}

impl EmailAddressWithName {
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn email(&self) -> &str {
        self.0.email.as_ref()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for EmailAddressWithName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EmailAddress {
    type Err = <lettre::Address as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl FromStr for EmailAddressWithName {
    type Err = <lettre::message::Mailbox as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}
