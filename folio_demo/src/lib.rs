//! Fixtures shared by the tests of all crates.

use std::sync::LazyLock;

use folio_models::{
    contact::{ContactForm, ContactSubmission},
    email_address::{EmailAddress, EmailAddressWithName},
};

pub const CONTACT_EMAIL: &str = "owner@folio.example";
pub const FROM: &str = "Portfolio Contact <noreply@folio.example>";
pub const SENDGRID_API_KEY: &str = "SG.test-key";

pub static CONTACT_ADDRESS: LazyLock<EmailAddress> =
    LazyLock::new(|| CONTACT_EMAIL.parse().unwrap());
pub static FROM_ADDRESS: LazyLock<EmailAddressWithName> = LazyLock::new(|| FROM.parse().unwrap());

pub struct DemoSubmission {
    pub form: ContactForm,
    pub submission: ContactSubmission,
}

pub static JANE: LazyLock<DemoSubmission> = LazyLock::new(|| {
    demo(ContactForm::new(
        "Jane Doe",
        "jane@example.com",
        "Hello, I would like to get in touch about a project.",
    ))
});

pub static MAX: LazyLock<DemoSubmission> = LazyLock::new(|| {
    demo(ContactForm {
        subject: Some("Speaking <invitation> & more".into()),
        ..ContactForm::new(
            "Max Mustermann",
            "Max.Mustermann@Example.de",
            "Would you like to give a talk at our <b>meetup</b> next month?",
        )
    })
});

fn demo(form: ContactForm) -> DemoSubmission {
    let submission = form.validate().unwrap();
    DemoSubmission { form, submission }
}
