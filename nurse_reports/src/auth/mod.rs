//! Session lifecycle and page access.
//!
//! The auth provider issues an HS256 access token and a refresh token. This
//! module keeps that pair per visitor and decides, on every page entry,
//! whether the visitor may see the page:
//! - [`TokenStore`] holds the pair
//! - [`ClaimsDecoder`] verifies the access token against an injected clock
//! - [`SessionRefresher`] exchanges the pair shortly before expiry
//! - [`gate::check`] maps claims and profile to allow or deny
//! - [`PageGuard`] runs the above in order
//!
//! ## Example
//!
//! ```no_run
//! use nurse_reports::auth::{AccessLevel, ClaimsDecoder, PageGuard, RefreshFailurePolicy,
//!     RefreshWindow, SessionRefresher, TokenStore};
//! use nurse_reports::baas::{BaasClient, BaasConfig};
//! use nurse_reports::clock::SystemClock;
//! use nurse_reports::profile::ProfileService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(BaasClient::new(BaasConfig::development("anon-key"))?);
//!     let clock = Arc::new(SystemClock);
//!     let guard = PageGuard::new(
//!         TokenStore::new(),
//!         ClaimsDecoder::new("jwt-secret-from-the-provider-dashboard", "authenticated"),
//!         SessionRefresher::new(client.clone(), RefreshWindow::default(), RefreshFailurePolicy::default()),
//!         ProfileService::new(client, clock.clone()),
//!         clock,
//!     );
//!
//!     match guard.enter(AccessLevel::ReportSubmitted, None).await {
//!         Ok(page) => println!("Welcome {:?}", page.user_id()),
//!         Err(denial) => println!("Redirect to {}: {}", denial.redirect_target(), denial.message()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod errors;
pub mod gate;
pub mod guard;
pub mod manager;
pub mod models;
pub mod refresher;
pub mod store;

pub use claims::{ClaimsDecoder, ClaimsResult};
pub use errors::{AuthError, AuthResult};
pub use gate::{AccessLevel, DenyReason};
pub use guard::{Denial, PageContext, PageGuard};
pub use manager::AuthManager;
pub use models::{Claims, Credentials, LogoutReason, Session};
pub use refresher::{RefreshFailurePolicy, RefreshWindow, SessionRefresher};
pub use store::TokenStore;
