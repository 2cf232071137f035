use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::{ContactMessageContent, ContactName, ContactSubject, ContactSubmission};
use crate::email_address::EmailAddress;

const NAME_REQUIRED: &str = "Name is required";
const NAME_LENGTH: &str = "Name must be between 2 and 100 characters";
const EMAIL_REQUIRED: &str = "Email is required";
const EMAIL_INVALID: &str = "Valid email is required";
const MESSAGE_REQUIRED: &str = "Message is required";
const MESSAGE_LENGTH: &str = "Message must be between 10 and 1000 characters";
const SUBJECT_LENGTH: &str = "Subject must be at most 256 characters";

/// Unvalidated contact form input, as typed by the user or received over the
/// wire.
///
/// Numbers and booleans are read as their string form. Other non-string
/// values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        String(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
        Bool(bool),
        Other(IgnoredAny),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::String(x) => Some(x),
        Field::Signed(x) => Some(x.to_string()),
        Field::Unsigned(x) => Some(x.to_string()),
        Field::Float(x) => Some(x.to_string()),
        Field::Bool(x) => Some(x.to_string()),
        Field::Other(_) => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Message,
    Subject,
}

impl ContactField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
            Self::Subject => "subject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: ContactField,
    pub msg: &'static str,
}

/// All field violations of a rejected [`ContactForm`], in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn messages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|v| v.msg)
    }
}

fn join_messages(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.msg)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
            subject: None,
        }
    }

    /// Checks every field and returns the normalized submission, or all
    /// violations found.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationErrors> {
        let mut violations = Vec::new();

        let name = check(&mut violations, ContactField::Name, validate_name(self.name.as_deref()));
        let email = check(
            &mut violations,
            ContactField::Email,
            validate_email(self.email.as_deref()),
        );
        let message = check(
            &mut violations,
            ContactField::Message,
            validate_message(self.message.as_deref()),
        );
        let subject = check(
            &mut violations,
            ContactField::Subject,
            validate_subject(self.subject.as_deref()),
        );

        match (name, email, message, subject) {
            (Some(name), Some(email), Some(message), Some(subject)) => Ok(ContactSubmission {
                name,
                email,
                message,
                subject,
            }),
            _ => Err(ValidationErrors(violations)),
        }
    }
}

impl From<&ContactSubmission> for ContactForm {
    fn from(value: &ContactSubmission) -> Self {
        Self {
            name: Some(value.name.clone().into_inner()),
            email: Some(value.email.as_str().to_owned()),
            message: Some(value.message.clone().into_inner()),
            subject: Some(value.subject.clone().into_inner()),
        }
    }
}

fn check<T>(
    violations: &mut Vec<FieldViolation>,
    field: ContactField,
    result: Result<T, &'static str>,
) -> Option<T> {
    result
        .map_err(|msg| violations.push(FieldViolation { field, msg }))
        .ok()
}

fn required(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_name(raw: Option<&str>) -> Result<ContactName, &'static str> {
    let raw = required(raw).ok_or(NAME_REQUIRED)?;
    ContactName::try_new(raw.to_owned()).map_err(|_| NAME_LENGTH)
}

fn validate_email(raw: Option<&str>) -> Result<EmailAddress, &'static str> {
    let raw = required(raw).ok_or(EMAIL_REQUIRED)?;
    EmailAddress::parse_normalized(raw).map_err(|_| EMAIL_INVALID)
}

fn validate_message(raw: Option<&str>) -> Result<ContactMessageContent, &'static str> {
    let raw = required(raw).ok_or(MESSAGE_REQUIRED)?;
    ContactMessageContent::try_new(raw.to_owned()).map_err(|_| MESSAGE_LENGTH)
}

fn validate_subject(raw: Option<&str>) -> Result<ContactSubject, &'static str> {
    match required(raw) {
        None => Ok(ContactSubject::default()),
        Some(raw) => ContactSubject::try_new(raw.to_owned()).map_err(|_| SUBJECT_LENGTH),
    }
}
