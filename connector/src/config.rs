//! Connector configuration.
//!
//! [`ConnectorConfig`] is the static, operator supplied half of the
//! configuration. [`ResolvedConfig`] is produced by discovery on every flow
//! and merges the static values with the provider's published endpoints.

use crate::constants::{DEFAULT_SCOPE, OPENID_SCOPE};
use crate::error::{ConnectorError, Result};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use url::Url;

/// How the client authenticates itself at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenEndpointAuthMethod {
    /// Credentials sent as `client_id` / `client_secret` form fields.
    #[default]
    ClientSecretPost,

    /// Credentials sent in an HTTP Basic `Authorization` header.
    ClientSecretBasic,
}

/// Optional parameters appended to the authorization request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequestOptions {
    /// `prompt` parameter (e.g. `login`, `consent`).
    pub prompt: Option<String>,

    /// `response_mode` parameter (e.g. `query`, `form_post`).
    pub response_mode: Option<String>,

    /// Additional provider specific parameters, appended verbatim.
    ///
    /// Entries that collide with a protocol parameter are ignored.
    pub extra_params: Vec<(String, String)>,
}

/// ID token verification knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTokenVerification {
    /// Clock skew tolerated when checking `exp`.
    ///
    /// Default: zero. No implicit tolerance is applied.
    pub clock_skew: Duration,

    /// Signature algorithms accepted in the token header.
    ///
    /// Default: `RS256`, `ES256`. Symmetric algorithms are always rejected.
    pub algorithms: Vec<Algorithm>,
}

impl Default for IdTokenVerification {
    fn default() -> Self {
        Self {
            clock_skew: Duration::zero(),
            algorithms: vec![Algorithm::RS256, Algorithm::ES256],
        }
    }
}

/// Static connector configuration.
///
/// Immutable for the lifetime of a connector instance.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// OAuth client identifier registered with the provider.
    pub client_id: String,

    /// OAuth client secret (keep confidential).
    pub client_secret: String,

    /// Issuer URL, compared verbatim against the `iss` claim.
    pub issuer: String,

    /// Space separated scope string.
    ///
    /// Default: `openid profile email`
    pub scope: String,

    /// Token endpoint client authentication.
    ///
    /// Default: `client_secret_post`
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Optional authorization request parameters.
    pub auth_request: AuthRequestOptions,

    /// ID token verification settings.
    pub verification: IdTokenVerification,
}

impl ConnectorConfig {
    /// Create a new connector configuration.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Client identifier registered with the provider
    /// * `client_secret` - Client secret
    /// * `issuer` - Issuer URL (e.g. `https://idp.example/oidc`)
    #[must_use]
    pub fn new(client_id: String, client_secret: String, issuer: String) -> Self {
        Self {
            client_id,
            client_secret,
            issuer,
            scope: DEFAULT_SCOPE.to_string(),
            token_endpoint_auth_method: TokenEndpointAuthMethod::default(),
            auth_request: AuthRequestOptions::default(),
            verification: IdTokenVerification::default(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Reads `OIDC_CLIENT_ID`, `OIDC_CLIENT_SECRET`, `OIDC_ISSUER` and the
    /// optional `OIDC_SCOPE`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidConfig`] if a required variable is unset.
    pub fn from_env() -> Result<Self> {
        fn required(name: &str) -> Result<String> {
            std::env::var(name)
                .map_err(|_| ConnectorError::InvalidConfig(format!("{name} is not set")))
        }

        let config = Self::new(
            required("OIDC_CLIENT_ID")?,
            required("OIDC_CLIENT_SECRET")?,
            required("OIDC_ISSUER")?,
        );

        Ok(match std::env::var("OIDC_SCOPE") {
            Ok(scope) => config.with_scope(scope),
            Err(_) => config,
        })
    }

    /// Set the requested scope string.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set token endpoint client authentication.
    #[must_use]
    pub const fn with_token_endpoint_auth_method(mut self, method: TokenEndpointAuthMethod) -> Self {
        self.token_endpoint_auth_method = method;
        self
    }

    /// Set optional authorization request parameters.
    #[must_use]
    pub fn with_auth_request(mut self, options: AuthRequestOptions) -> Self {
        self.auth_request = options;
        self
    }

    /// Set the tolerated clock skew for `exp` checks.
    #[must_use]
    pub const fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.verification.clock_skew = skew;
        self
    }

    /// Set the accepted ID token signature algorithms.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.verification.algorithms = algorithms;
        self
    }

    /// Scope to send on the wire: the configured scope, with `openid` guaranteed.
    #[must_use]
    pub fn effective_scope(&self) -> String {
        let mut scopes: Vec<&str> = self.scope.split_whitespace().collect();
        if !scopes.contains(&OPENID_SCOPE) {
            scopes.insert(0, OPENID_SCOPE);
        }
        scopes.join(" ")
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("scope", &self.scope)
            .field("token_endpoint_auth_method", &self.token_endpoint_auth_method)
            .field("auth_request", &self.auth_request)
            .field("verification", &self.verification)
            .finish()
    }
}

/// Static configuration merged with discovered provider metadata.
///
/// Produced fresh by every discovery call and never persisted. Holding a
/// `ResolvedConfig` guarantees the endpoints downstream phases need are
/// present and parse as URLs.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The static configuration this was resolved from.
    pub client: ConnectorConfig,

    /// Scope sent in the authorization request.
    pub scope: String,

    /// Discovered authorization endpoint.
    pub authorization_endpoint: Url,

    /// Discovered token endpoint.
    pub token_endpoint: Url,

    /// Discovered JWKS endpoint.
    pub jwks_uri: Url,

    /// Discovered userinfo endpoint (informational).
    pub userinfo_endpoint: Option<Url>,

    /// Scopes the provider advertises.
    pub scopes_supported: Vec<String>,
}

impl ResolvedConfig {
    /// Issuer the `iss` claim must match.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.client.issuer
    }

    /// Client identifier the `aud` claim must contain.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client.client_id
    }
}
