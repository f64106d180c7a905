//! # OIDC Single Sign-On Connector
//!
//! Client-side OpenID Connect connector that delegates authentication to an
//! external OIDC provider.
//!
//! ## Features
//!
//! - **Discovery**: Endpoints come from the provider's published metadata
//! - **Replay protection**: A fresh nonce per flow, checked against the ID token
//! - **Strict validation**: Signature, issuer, audience, expiration and nonce
//! - **Attested contacts**: Unverified email/phone never reach [`UserInfo`]
//! - **Testable**: Transport and session storage are injected traits
//!
//! ## Architecture
//!
//! ```text
//! begin_authorization:    Discovery → Nonce → FlowSessionStore::store → Authorization URL
//! complete_authorization: Discovery → Token Exchange → ID Token Validator → Claims Mapper
//! ```
//!
//! ## Example: Sign-in
//!
//! ```rust,ignore
//! use oidc_sso_connector::*;
//!
//! // 1. Redirect the browser to the provider
//! let url = connector.begin_authorization(&state, &redirect_uri, "conn1").await?;
//!
//! // 2. Provider redirects back; recover the flow session by state
//! let session = store.consume(&state).await?.ok_or(ConnectorError::StateMismatch)?;
//!
//! // 3. Exchange the code and validate the ID token
//! let user: UserInfo = connector.complete_authorization(&session, &payload).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod authorization;
pub mod claims;
pub mod config;
pub mod connector;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod providers;
pub mod token;
pub mod validator;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use claims::UserInfo;
pub use config::{ConnectorConfig, ResolvedConfig};
pub use connector::OidcConnector;
pub use error::{ConnectorError, Result};
pub use providers::{FlowSession, FlowSessionStore, HttpTransport};
pub use validator::IdentityClaims;
