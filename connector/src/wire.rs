//! Wire format mapping.
//!
//! Everything that turns connector values into OIDC parameter names (and
//! back) lives here. Business logic builds the typed structs below and never
//! touches parameter names directly.

use crate::constants::{params, GRANT_TYPE_AUTHORIZATION_CODE, RESPONSE_TYPE_CODE};
use serde::Deserialize;

/// Parameters of an authorization request, before wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationParams<'a> {
    /// OAuth client identifier.
    pub client_id: &'a str,
    /// Redirect URI registered with the provider.
    pub redirect_uri: &'a str,
    /// Space separated scopes.
    pub scope: &'a str,
    /// Caller supplied state.
    pub state: &'a str,
    /// Freshly generated nonce.
    pub nonce: &'a str,
    /// Optional `prompt`.
    pub prompt: Option<&'a str>,
    /// Optional `response_mode`.
    pub response_mode: Option<&'a str>,
    /// Provider specific extras.
    pub extra: &'a [(String, String)],
}

impl<'a> AuthorizationParams<'a> {
    /// Map to `(wire name, value)` pairs in a stable order.
    ///
    /// Extra parameters that collide with a protocol parameter are dropped.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'a str, &'a str)> {
        let mut pairs = vec![
            (params::CLIENT_ID, self.client_id),
            (params::RESPONSE_TYPE, RESPONSE_TYPE_CODE),
            (params::REDIRECT_URI, self.redirect_uri),
            (params::SCOPE, self.scope),
            (params::STATE, self.state),
            (params::NONCE, self.nonce),
        ];

        if let Some(prompt) = self.prompt {
            pairs.push((params::PROMPT, prompt));
        }

        if let Some(response_mode) = self.response_mode {
            pairs.push((params::RESPONSE_MODE, response_mode));
        }

        for (name, value) in self.extra {
            if pairs.iter().any(|(existing, _)| *existing == name.as_str()) {
                tracing::warn!(param = %name, "Ignoring extra parameter that overrides a protocol parameter");
                continue;
            }
            pairs.push((name.as_str(), value.as_str()));
        }

        pairs
    }
}

/// Percent-encode pairs into a query string (RFC 3986, spaces as `%20`).
#[must_use]
pub fn encode_query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Form body for the authorization-code grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequestParams<'a> {
    /// Authorization code from the callback.
    pub code: &'a str,
    /// Redirect URI used in the authorization request.
    pub redirect_uri: &'a str,
    /// Client credentials, present only for `client_secret_post`.
    pub client_credentials: Option<(&'a str, &'a str)>,
}

impl TokenRequestParams<'_> {
    /// Encode as an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_form_body(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let mut pairs = vec![
            (params::GRANT_TYPE, GRANT_TYPE_AUTHORIZATION_CODE),
            (params::CODE, self.code),
            (params::REDIRECT_URI, self.redirect_uri),
        ];

        if let Some((client_id, client_secret)) = self.client_credentials {
            pairs.push((params::CLIENT_ID, client_id));
            pairs.push((params::CLIENT_SECRET, client_secret));
        }

        serde_urlencoded::to_string(pairs)
    }
}

/// Form-urlencode a client credential for HTTP Basic authentication (RFC 6749 §2.3.1).
#[must_use]
pub fn encode_basic_credential(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Parameters the provider sends back to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    #[serde(default)]
    pub code: Option<String>,

    /// State echoed back by the provider.
    #[serde(default)]
    pub state: Option<String>,

    /// OAuth error code when authorization failed.
    #[serde(default)]
    pub error: Option<String>,

    /// Human readable error description.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponseBody {
    /// Access token.
    pub access_token: Option<String>,

    /// Token type (usually `Bearer`).
    pub token_type: Option<String>,

    /// Compact serialized identity token.
    pub id_token: Option<String>,

    /// Refresh token, if issued.
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds.
    pub expires_in: Option<u64>,

    /// Granted scopes.
    pub scope: Option<String>,
}

/// OAuth 2.0 error response body (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    /// Error code.
    pub error: String,

    /// Human readable description.
    #[serde(default)]
    pub error_description: Option<String>,
}
