//! `reqwest` backed HTTP transport.

use super::{BasicAuth, HttpResponse, HttpTransport, TransportError};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Production transport built on `reqwest`.
///
/// Redirects are not followed: discovery, JWKS and token endpoints are
/// expected to answer directly.
///
/// # Example
///
/// ```no_run
/// use oidc_sso_connector::providers::ReqwestTransport;
///
/// let transport = ReqwestTransport::new();
/// ```
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    /// HTTP client for making requests.
    http_client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a 10 second timeout and no redirects.
    #[must_use]
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self { http_client }
    }

    /// Use a preconfigured client (proxies, custom roots, timeouts).
    #[must_use]
    pub const fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Self::into_response(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        body: String,
        basic_auth: Option<BasicAuth>,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self
            .http_client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);

        if let Some(auth) = basic_auth {
            request = request.basic_auth(auth.username, Some(auth.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Self::into_response(response).await
    }
}
