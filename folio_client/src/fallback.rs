use folio_models::{
    contact::{ContactForm, DEFAULT_SUBJECT},
    email_address::EmailAddress,
};

/// Builds a `mailto:` link that opens the user's email client with the
/// current form values, so a message can be sent without the api.
///
/// Values are used as entered, without validation.
pub fn mailto_link(recipient: &EmailAddress, form: &ContactForm) -> String {
    let subject = form
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .unwrap_or(DEFAULT_SUBJECT);

    let body = format!(
        "Name: {}\nEmail: {}\n\nMessage: {}",
        form.name.as_deref().unwrap_or_default(),
        form.email.as_deref().unwrap_or_default(),
        form.message.as_deref().unwrap_or_default(),
    );

    format!(
        "mailto:{recipient}?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(&body)
    )
}

#[cfg(test)]
mod tests {
    use folio_demo::{CONTACT_ADDRESS, JANE};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn full_form() {
        let link = mailto_link(&CONTACT_ADDRESS, &JANE.form);
        assert_eq!(
            link,
            "mailto:owner@folio.example?subject=New%20Contact%20Form%20Submission&body=Name%3A%20Jane%20Doe%0AEmail%3A%20jane%40example.com%0A%0AMessage%3A%20Hello%2C%20I%20would%20like%20to%20get%20in%20touch%20about%20a%20project."
        );
    }

    #[test]
    fn partial_form_keeps_everything_typed() {
        let form = ContactForm {
            name: Some("Jane & Co".into()),
            email: None,
            message: Some("50% off?\nCall me".into()),
            subject: Some("Re: offer".into()),
        };

        let link = mailto_link(&CONTACT_ADDRESS, &form);

        assert!(link.starts_with("mailto:owner@folio.example?subject=Re%3A%20offer&body="));
        let body = link.split("&body=").nth(1).unwrap();
        assert_eq!(
            urlencoding::decode(body).unwrap(),
            "Name: Jane & Co\nEmail: \n\nMessage: 50% off?\nCall me"
        );
    }
}
