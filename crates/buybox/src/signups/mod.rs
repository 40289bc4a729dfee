//! Marketing-site sign-ups: newsletter, waitlist and seller leads.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Lead, LeadId, LeadRequest, NewsletterRequest, NewsletterSubscription, WaitlistEntry,
    WaitlistRequest,
};
pub use repository::SignupRepository;
pub use router::signup_router;
pub use service::{SignupError, SignupService};
