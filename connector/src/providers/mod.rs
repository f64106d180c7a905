//! External collaborators.
//!
//! This module defines traits for everything the connector does not own:
//! the HTTP transport used to talk to the provider, and the store that keeps
//! a [`FlowSession`] between the authorization redirect and the callback.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The connector depends on
//! these traits and the application supplies concrete implementations.
//!
//! ```text
//! ┌──────────────────┐    get / post_form    ┌──────────────────┐
//! │ OidcConnector    │──────────────────────▶│ HttpTransport    │──▶ IdP
//! │ - discovery      │                       └──────────────────┘
//! │ - authorization  │    store (once)       ┌──────────────────┐
//! │ - token exchange │──────────────────────▶│ FlowSessionStore │
//! │ - validation     │                       └──────────────────┘
//! └──────────────────┘                               ▲ consume / delete
//!                                                    │ (caller, at callback)
//! ```
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Use [`ReqwestTransport`] and a shared store (Redis, SQL)

pub mod reqwest_transport;
pub mod session;

pub use reqwest_transport::ReqwestTransport;
pub use session::{FlowSession, FlowSessionStore};

use std::future::Future;
use thiserror::Error;

/// Raw HTTP response as seen by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP Basic credentials for the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name (client identifier, already form-urlencoded).
    pub username: String,

    /// Password (client secret, already form-urlencoded).
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Transport level failure (connection refused, timeout, TLS, ...).
///
/// The connector maps these onto its own taxonomy depending on the phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// HTTP transport used for discovery, key set fetches, and token exchange.
///
/// Implementations own timeouts, TLS, and retry policy. They must fail fast
/// rather than hang, and must never retry `post_form` on their own since the
/// token exchange is not idempotent.
pub trait HttpTransport: Send + Sync {
    /// Perform a GET request expecting a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response could be obtained.
    /// Non-2xx statuses are returned as a normal [`HttpResponse`].
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;

    /// Perform a POST with an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response could be obtained.
    /// Non-2xx statuses are returned as a normal [`HttpResponse`].
    fn post_form(
        &self,
        url: &str,
        body: String,
        basic_auth: Option<BasicAuth>,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
