//! User profiles: onboarding state, saved hospitals and submitted reports.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::{ProfileError, ProfileResult};
pub use models::{Membership, ProfileUpdate, UserProfile};
pub use service::ProfileService;
