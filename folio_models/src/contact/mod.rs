use nutype::nutype;

use crate::email_address::{EmailAddress, EmailAddressWithName};

mod form;

pub use form::{ContactField, ContactForm, FieldViolation, ValidationErrors};

/// Subject used when a submission does not provide one.
pub const DEFAULT_SUBJECT: &str = "New Contact Form Submission";

/// A validated contact form submission.
///
/// Values of this type can only be obtained through [`ContactForm::validate`]
/// or by constructing the validated field types directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: EmailAddress,
    pub message: ContactMessageContent,
    pub subject: ContactSubject,
}

impl ContactSubmission {
    /// The submitter as a mailbox, suitable for a `Reply-To` header.
    pub fn author(&self) -> EmailAddressWithName {
        self.email.clone().with_name(self.name.clone().into_inner())
    }
}

#[nutype(
    sanitize(trim),
    validate(len_char_min = 2, len_char_max = 100),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactName(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 10, len_char_max = 1000),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactSubject(String);

impl Default for ContactSubject {
    fn default() -> Self {
        Self::try_new(DEFAULT_SUBJECT.to_owned()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_subject_matches_constant() {
        assert_eq!(ContactSubject::default().into_inner(), DEFAULT_SUBJECT);
    }

    #[test]
    fn name_is_trimmed_before_length_check() {
        assert!(ContactName::try_new(" J ".to_owned()).is_err());
        assert_eq!(
            ContactName::try_new("  Jo  ".to_owned()).unwrap().into_inner(),
            "Jo"
        );
    }

    #[test]
    fn message_length_counts_chars() {
        assert!(ContactMessageContent::try_new("ééééééééé".to_owned()).is_err());
        assert!(ContactMessageContent::try_new("éééééééééé".to_owned()).is_ok());
        assert!(ContactMessageContent::try_new("x".repeat(1001)).is_err());
    }
}
