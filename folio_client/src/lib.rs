//! Client side of the contact form: submits forms to the api, tracks the
//! submission status and offers a mailto link when the api cannot be reached.

pub mod api;
pub mod controller;
pub mod fallback;
