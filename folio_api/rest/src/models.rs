use folio_models::contact::FieldViolation;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiMessage<'a> {
    pub message: &'a str,
}

#[derive(Serialize)]
pub struct ApiError<'a> {
    pub message: &'a str,
    pub error: &'a str,
}

#[derive(Serialize)]
pub struct ApiSuccess {
    pub message: &'static str,
    pub success: bool,
}

#[derive(Serialize)]
pub struct ApiValidationFailed {
    pub message: &'static str,
    pub errors: Vec<ApiFieldError>,
}

/// A single rejected field, shaped like the errors of common form
/// validation libraries so existing clients can display them.
#[derive(Serialize)]
pub struct ApiFieldError {
    pub msg: &'static str,
    pub path: &'static str,
    pub location: &'static str,
}

impl From<&FieldViolation> for ApiFieldError {
    fn from(value: &FieldViolation) -> Self {
        Self {
            msg: value.msg,
            path: value.field.as_str(),
            location: "body",
        }
    }
}

#[derive(Serialize)]
pub struct ApiHealth {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub email: bool,
}
