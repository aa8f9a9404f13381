//! Credential validation and group lookup delegated to a Jira instance
//!
//! Rather than keeping its own user store, a security realm built on this
//! crate asks Jira two questions through its REST API: "does this password
//! match this username?" and "which groups does this username belong to?"
//!
//! The first question is answered with the end user's own credentials on
//! the wire, so Jira's own authentication decides. The second uses a fixed
//! technical account, so loading group memberships never requires the end
//! user's password.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use jira_realm::{
//!     JiraAuthenticationService, Password, ServiceConfig, TrustPolicy, Username,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::new(
//!     "https://jira.example.com",
//!     Username::from_static("svc-realm"),
//!     Password::from_static("technical-account-password"),
//!     Duration::from_secs(10),
//!     TrustPolicy::PlatformDefault,
//! )?;
//!
//! let service = JiraAuthenticationService::new(config)?;
//!
//! match service.authenticate("alice", "wonderland").await {
//!     Ok(_) => {
//!         let user = service.load_groups_for_user("alice").await?;
//!         tracing::info!(groups = ?user.groups(), "login succeeded");
//!     }
//!     Err(error) => {
//!         tracing::warn!(error = %error, "login attempt failed");
//!         println!("{}", error.user_message());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Every failure is reported as one of the [`AuthError`] variants. Only
//! [`AuthError::InvalidCredentials`], produced when Jira answers with
//! `401` or `403`, means that an identity was rejected. Timeouts, connection
//! problems, unexpected statuses and unusable response bodies are kept
//! apart from it, so an outage is never reported to a user as a wrong
//! password. [`AuthError::user_message()`] gives the text that is safe to
//! show at a login form.
//!
//! # Feature flags
//!
//! * `rustls-tls` (default): use `rustls` for HTTPS connections to Jira,
//!   trusting the roots in the operating system's certificate store.
//!   Required for [`TrustPolicy::TrustAllCertificates`].
//! * `default-tls`: use the platform's native TLS implementation instead.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

#[cfg(not(any(feature = "rustls-tls", feature = "default-tls")))]
compile_error!("either the `rustls-tls` or the `default-tls` feature must be enabled");

mod braids;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
mod service;
#[cfg(test)]
mod test_util;
pub mod tls;
pub mod transport;

pub use braids::*;
pub use config::{ConfigError, ServiceConfig, ServiceSettings};
pub use error::{AuthError, AuthErrorKind, CredentialSubject, Unavailable};
pub use response::{MalformedResponse, UserGroups};
pub use service::JiraAuthenticationService;
pub use tls::TrustPolicy;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
