//! Authorization code exchange.

use crate::config::{ResolvedConfig, TokenEndpointAuthMethod};
use crate::constants::ERROR_INVALID_GRANT;
use crate::error::{ConnectorError, Result};
use crate::providers::{BasicAuth, HttpResponse, HttpTransport};
use crate::wire::{encode_basic_credential, CallbackParams, OAuthErrorBody, TokenRequestParams, TokenResponseBody};
use tracing::instrument;

/// Tokens returned by the provider's token endpoint.
///
/// Only `id_token` is processed further; the rest is handed through.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    /// Compact serialized identity token (not yet validated).
    pub id_token: String,

    /// Access token, if issued.
    pub access_token: Option<String>,

    /// Refresh token, if issued.
    pub refresh_token: Option<String>,

    /// Token type (usually `Bearer`).
    pub token_type: Option<String>,

    /// Access token lifetime in seconds.
    pub expires_in: Option<u64>,

    /// Granted scopes.
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"[REDACTED]")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Parse the raw callback payload.
///
/// # Errors
///
/// - [`ConnectorError::ProviderError`] if the provider reported an error
/// - [`ConnectorError::InvalidAuthCode`] if the payload is not an object
pub fn parse_callback(payload: &serde_json::Value) -> Result<CallbackParams> {
    let params: CallbackParams = serde_json::from_value(payload.clone()).map_err(|e| {
        tracing::warn!(error = %e, "Malformed callback payload");
        ConnectorError::InvalidAuthCode
    })?;

    if let Some(error) = params.error.clone() {
        tracing::warn!(error = %error, "Provider returned an authorization error");
        return Err(ConnectorError::ProviderError {
            error,
            description: params.error_description.clone(),
        });
    }

    Ok(params)
}

/// Exchange the authorization code from `payload` for tokens.
///
/// `redirect_uri` must be the exact value sent in the authorization request.
///
/// # Errors
///
/// - [`ConnectorError::InvalidAuthCode`] if the code is missing or the provider
///   answers `invalid_grant`
/// - [`ConnectorError::ProviderError`] for any other OAuth error response
/// - [`ConnectorError::InvalidAccessToken`] if the endpoint is unreachable or
///   the response is unusable
#[instrument(skip(resolved, payload, transport), fields(token_endpoint = %resolved.token_endpoint))]
pub async fn exchange_code<T: HttpTransport>(
    resolved: &ResolvedConfig,
    payload: &serde_json::Value,
    redirect_uri: &str,
    transport: &T,
) -> Result<TokenSet> {
    let callback = parse_callback(payload)?;
    let code = callback
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or(ConnectorError::InvalidAuthCode)?;

    let client = &resolved.client;
    let (client_credentials, basic_auth) = match client.token_endpoint_auth_method {
        TokenEndpointAuthMethod::ClientSecretPost => {
            (Some((client.client_id.as_str(), client.client_secret.as_str())), None)
        }
        TokenEndpointAuthMethod::ClientSecretBasic => (
            None,
            Some(BasicAuth {
                username: encode_basic_credential(&client.client_id),
                password: encode_basic_credential(&client.client_secret),
            }),
        ),
    };

    let body = TokenRequestParams {
        code,
        redirect_uri,
        client_credentials,
    }
    .to_form_body()
    .map_err(|e| ConnectorError::InvalidAccessToken(format!("Failed to encode token request: {e}")))?;

    let response = transport
        .post_form(resolved.token_endpoint.as_str(), body, basic_auth)
        .await
        .map_err(|e| ConnectorError::InvalidAccessToken(e.to_string()))?;

    parse_token_response(&response)
}

/// Interpret a token endpoint response.
///
/// # Errors
///
/// See [`exchange_code`].
pub fn parse_token_response(response: &HttpResponse) -> Result<TokenSet> {
    if !response.is_success() {
        return Err(token_error(response));
    }

    let body: TokenResponseBody = serde_json::from_str(&response.body)
        .map_err(|e| ConnectorError::InvalidAccessToken(format!("Malformed token response: {e}")))?;

    let id_token = body
        .id_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ConnectorError::InvalidAccessToken("Token response has no id_token".to_string()))?;

    tracing::debug!(has_refresh_token = body.refresh_token.is_some(), "Token exchange succeeded");

    Ok(TokenSet {
        id_token,
        access_token: body.access_token,
        refresh_token: body.refresh_token,
        token_type: body.token_type,
        expires_in: body.expires_in,
        scope: body.scope,
    })
}

fn token_error(response: &HttpResponse) -> ConnectorError {
    let Ok(error) = serde_json::from_str::<OAuthErrorBody>(&response.body) else {
        tracing::error!(status = response.status, body = %response.body, "Token exchange failed");
        return ConnectorError::InvalidAccessToken(format!(
            "Token endpoint returned status {}",
            response.status
        ));
    };

    tracing::error!(
        status = response.status,
        error = %error.error,
        description = ?error.error_description,
        "Token endpoint rejected the exchange"
    );

    if error.error == ERROR_INVALID_GRANT && matches!(response.status, 400 | 401) {
        ConnectorError::InvalidAuthCode
    } else {
        ConnectorError::ProviderError {
            error: error.error,
            description: error.error_description,
        }
    }
}
