//! OIDC discovery.
//!
//! Fetches `{issuer}/.well-known/openid-configuration` and merges the
//! published endpoints with the static [`ConnectorConfig`]. Endpoints always
//! come from the provider; issuer, credentials and scope come from the
//! operator.

use crate::config::{ConnectorConfig, ResolvedConfig};
use crate::constants::WELL_KNOWN_PATH;
use crate::error::{ConnectorError, Result};
use crate::providers::HttpTransport;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

/// Provider metadata as published in the discovery document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier the provider claims.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Authorization endpoint.
    #[serde(default)]
    pub authorization_endpoint: Option<String>,

    /// Token endpoint.
    #[serde(default)]
    pub token_endpoint: Option<String>,

    /// JWKS endpoint.
    #[serde(default)]
    pub jwks_uri: Option<String>,

    /// Userinfo endpoint.
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,

    /// Supported scopes.
    #[serde(default)]
    pub scopes_supported: Vec<String>,

    /// Supported ID token signing algorithms.
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Supported token endpoint client authentication methods.
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// Discovery document URL for an issuer.
///
/// # Examples
///
/// ```
/// use oidc_sso_connector::discovery::well_known_url;
///
/// assert_eq!(
///     well_known_url("https://idp.example/oidc/"),
///     "https://idp.example/oidc/.well-known/openid-configuration"
/// );
/// ```
#[must_use]
pub fn well_known_url(issuer: &str) -> String {
    format!("{}{WELL_KNOWN_PATH}", issuer.trim_end_matches('/'))
}

/// Fetch the provider's discovery document.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidConfig`] if the document is unreachable,
/// answers with a non-2xx status, or is not valid JSON.
#[instrument(skip(transport))]
pub async fn fetch_metadata<T: HttpTransport>(issuer: &str, transport: &T) -> Result<ProviderMetadata> {
    let url = well_known_url(issuer);

    let response = transport
        .get(&url)
        .await
        .map_err(|e| ConnectorError::InvalidConfig(format!("Discovery request failed: {e}")))?;

    if !response.is_success() {
        tracing::error!(status = response.status, "Discovery document request failed");
        return Err(ConnectorError::InvalidConfig(format!(
            "Discovery document returned status {}",
            response.status
        )));
    }

    serde_json::from_str(&response.body)
        .map_err(|e| ConnectorError::InvalidConfig(format!("Malformed discovery document: {e}")))
}

/// Merge discovered metadata onto the static configuration.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidConfig`] if the authorization, token or
/// JWKS endpoint is missing or is not an absolute URL.
pub fn merge(config: &ConnectorConfig, metadata: ProviderMetadata) -> Result<ResolvedConfig> {
    if let Some(discovered) = metadata.issuer.as_deref() {
        if discovered != config.issuer {
            tracing::warn!(
                configured = %config.issuer,
                discovered = %discovered,
                "Discovered issuer differs from configured issuer"
            );
        }
    }

    let userinfo_endpoint = match metadata.userinfo_endpoint.as_deref() {
        Some(raw) => Some(parse_endpoint("userinfo_endpoint", Some(raw))?),
        None => None,
    };

    Ok(ResolvedConfig {
        authorization_endpoint: parse_endpoint(
            "authorization_endpoint",
            metadata.authorization_endpoint.as_deref(),
        )?,
        token_endpoint: parse_endpoint("token_endpoint", metadata.token_endpoint.as_deref())?,
        jwks_uri: parse_endpoint("jwks_uri", metadata.jwks_uri.as_deref())?,
        userinfo_endpoint,
        scope: config.effective_scope(),
        scopes_supported: metadata.scopes_supported,
        client: config.clone(),
    })
}

/// Discover provider metadata and produce a fresh [`ResolvedConfig`].
///
/// Performs exactly one outbound request; nothing is cached.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidConfig`] on any discovery failure.
#[instrument(skip(config, transport), fields(issuer = %config.issuer))]
pub async fn resolve<T: HttpTransport>(config: &ConnectorConfig, transport: &T) -> Result<ResolvedConfig> {
    let metadata = fetch_metadata(&config.issuer, transport).await?;
    let resolved = merge(config, metadata)?;

    tracing::debug!(
        authorization_endpoint = %resolved.authorization_endpoint,
        token_endpoint = %resolved.token_endpoint,
        "Resolved provider configuration"
    );

    Ok(resolved)
}

fn parse_endpoint(field: &str, raw: Option<&str>) -> Result<Url> {
    let raw = raw
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConnectorError::InvalidConfig(format!("Discovery document is missing {field}")))?;

    let url = Url::parse(raw)
        .map_err(|e| ConnectorError::InvalidConfig(format!("{field} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "https" | "http") {
        return Err(ConnectorError::InvalidConfig(format!(
            "{field} has unsupported scheme {}",
            url.scheme()
        )));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MockHttpTransport;
    use crate::providers::HttpResponse;
    use serde_json::json;

    fn config() -> ConnectorConfig {
        ConnectorConfig::new(
            "c1".to_string(),
            "secret".to_string(),
            "https://idp.example/oidc".to_string(),
        )
        .with_scope("openid profile email")
    }

    fn metadata() -> serde_json::Value {
        json!({
            "issuer": "https://idp.example/oidc",
            "authorization_endpoint": "https://idp.example/authorize",
            "token_endpoint": "https://idp.example/token",
            "jwks_uri": "https://idp.example/jwks",
            "scopes_supported": ["openid", "profile", "email", "phone"],
        })
    }

    const WELL_KNOWN: &str = "https://idp.example/oidc/.well-known/openid-configuration";

    #[test]
    fn test_well_known_url_trims_trailing_slash() {
        assert_eq!(
            well_known_url("https://idp.example"),
            "https://idp.example/.well-known/openid-configuration"
        );
        assert_eq!(well_known_url("https://idp.example/oidc/"), WELL_KNOWN);
    }

    #[tokio::test]
    async fn test_resolve_uses_discovered_endpoints() {
        let transport = MockHttpTransport::new().with_json(WELL_KNOWN, &metadata());

        let resolved = resolve(&config(), &transport).await.unwrap();

        assert_eq!(resolved.authorization_endpoint.as_str(), "https://idp.example/authorize");
        assert_eq!(resolved.token_endpoint.as_str(), "https://idp.example/token");
        assert_eq!(resolved.jwks_uri.as_str(), "https://idp.example/jwks");
        assert_eq!(resolved.scope, "openid profile email");
        assert_eq!(resolved.scopes_supported.len(), 4);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_static_scope_wins_over_discovery() {
        let transport = MockHttpTransport::new().with_json(WELL_KNOWN, &metadata());

        let resolved = resolve(&config().with_scope("openid email"), &transport).await.unwrap();

        assert_eq!(resolved.scope, "openid email");
    }

    #[tokio::test]
    async fn test_missing_token_endpoint_is_invalid_config() {
        let mut document = metadata();
        document.as_object_mut().unwrap().remove("token_endpoint");
        let transport = MockHttpTransport::new().with_json(WELL_KNOWN, &document);

        let result = resolve(&config(), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidConfig(msg)) if msg.contains("token_endpoint")));
    }

    #[tokio::test]
    async fn test_non_url_endpoint_is_invalid_config() {
        let mut document = metadata();
        document["authorization_endpoint"] = json!("not a url");
        let transport = MockHttpTransport::new().with_json(WELL_KNOWN, &document);

        let result = resolve(&config(), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_malformed_document_is_invalid_config() {
        let transport =
            MockHttpTransport::new().with_response(WELL_KNOWN, HttpResponse::new(200, "<html>"));

        let result = resolve(&config(), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unreachable_document_is_invalid_config() {
        let transport = MockHttpTransport::new();

        let result = resolve(&config(), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_invalid_config() {
        let transport =
            MockHttpTransport::new().with_response(WELL_KNOWN, HttpResponse::new(503, "busy"));

        let result = resolve(&config(), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidConfig(msg)) if msg.contains("503")));
    }

    #[test]
    fn test_merge_tolerates_issuer_mismatch() {
        let mut document: ProviderMetadata = serde_json::from_value(metadata()).unwrap();
        document.issuer = Some("https://other.example".to_string());

        let resolved = merge(&config(), document).unwrap();

        assert_eq!(resolved.issuer(), "https://idp.example/oidc");
    }
}
