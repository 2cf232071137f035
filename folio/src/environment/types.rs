use folio_core_contact_impl::ContactFeatureServiceImpl;
use folio_core_health_impl::HealthFeatureServiceImpl;
use folio_email_impl::SendGridEmailService;
use folio_shared_impl::{rate_limit::RateLimitServiceImpl, time::TimeServiceImpl};
use folio_templates_impl::TemplateServiceImpl;

// API
pub type RestServer = folio_api_rest::RestServer<HealthFeature, ContactFeature, RateLimit>;

// Core
pub type ContactFeature = ContactFeatureServiceImpl<Email, Template>;
pub type HealthFeature = HealthFeatureServiceImpl<Time, ContactFeature>;

// Shared
pub type Time = TimeServiceImpl;
pub type RateLimit = RateLimitServiceImpl<Time>;

// Email
pub type Email = SendGridEmailService;

// Templates
pub type Template = TemplateServiceImpl;
