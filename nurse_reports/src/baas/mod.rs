//! Hosted backend: table-style REST persistence and the auth service.

pub mod client;
pub mod config;
pub mod errors;
pub mod query;
pub mod repository;
pub mod timeouts;

pub use client::BaasClient;
pub use config::BaasConfig;
pub use errors::{BaasError, BaasResult};
pub use query::Filter;
pub use repository::{
    AuthApi, FeedbackRepository, HospitalRepository, ReportRepository, UserRepository,
};
pub use timeouts::{DEFAULT_REQUEST_TIMEOUT, LONG_OPERATION_TIMEOUT, with_default_timeout, with_timeout};
