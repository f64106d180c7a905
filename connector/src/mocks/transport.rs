//! Mock HTTP transport for testing.

use crate::providers::{BasicAuth, HttpResponse, HttpTransport, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A request observed by [`MockHttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// `GET` or `POST`.
    pub method: &'static str,
    /// Requested URL.
    pub url: String,
    /// Form body (POST only).
    pub body: Option<String>,
    /// Basic credentials (POST only).
    pub basic_auth: Option<BasicAuth>,
}

/// Mock HTTP transport.
///
/// Serves canned responses keyed by method and URL and records every request.
/// Unknown URLs fail with a [`TransportError`], like an unreachable host.
///
/// **WARNING**: Do NOT use in production. This is for testing only!
#[derive(Debug, Clone, Default)]
pub struct MockHttpTransport {
    get_routes: Arc<Mutex<HashMap<String, HttpResponse>>>,
    post_routes: Arc<Mutex<HashMap<String, HttpResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpTransport {
    /// Create a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `GET url`.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn with_response(self, url: &str, response: HttpResponse) -> Self {
        self.get_routes.lock().unwrap().insert(url.to_string(), response);
        self
    }

    /// Serve a 200 JSON body for `GET url`.
    #[must_use]
    pub fn with_json(self, url: &str, body: &serde_json::Value) -> Self {
        self.with_response(url, HttpResponse::new(200, body.to_string()))
    }

    /// Serve `response` for `POST url`.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn with_post_response(self, url: &str, response: HttpResponse) -> Self {
        self.post_routes.lock().unwrap().insert(url.to_string(), response);
        self
    }

    /// Serve a JSON body with `status` for `POST url`.
    #[must_use]
    pub fn with_post_json(self, url: &str, status: u16, body: &serde_json::Value) -> Self {
        self.with_post_response(url, HttpResponse::new(status, body.to_string()))
    }

    /// All requests made so far, in order.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn lookup(
        routes: &Mutex<HashMap<String, HttpResponse>>,
        url: &str,
    ) -> Result<HttpResponse, TransportError> {
        routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError(format!("connection refused: {url}")))
    }
}

impl HttpTransport for MockHttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.record(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: None,
            basic_auth: None,
        });

        Self::lookup(&self.get_routes, url)
    }

    async fn post_form(
        &self,
        url: &str,
        body: String,
        basic_auth: Option<BasicAuth>,
    ) -> Result<HttpResponse, TransportError> {
        self.record(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            body: Some(body),
            basic_auth,
        });

        Self::lookup(&self.post_routes, url)
    }
}
