//! Authorization request construction.
//!
//! # Flow
//!
//! ```text
//! 1. Resolve provider configuration (discovery)
//! 2. Generate a fresh nonce
//! 3. Persist FlowSession { nonce, redirect_uri, connector_id, state }
//! 4. Redirect the browser to authorization_endpoint?client_id=..&nonce=..
//! ```
//!
//! Steps 1 and 3 are orchestrated by [`OidcConnector`](crate::OidcConnector);
//! this module holds the pure pieces.

use crate::config::ResolvedConfig;
use crate::constants::NONCE_BYTES;
use crate::wire::{encode_query, AuthorizationParams};
use base64::Engine;

/// Generate a cryptographically secure nonce.
///
/// Uses 32 bytes of randomness (256 bits), base64url encoded without padding.
#[must_use]
pub fn generate_nonce() -> String {
    let bytes: [u8; NONCE_BYTES] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the authorization URL the browser is redirected to.
///
/// Any query already present on the discovered endpoint is preserved.
#[must_use]
pub fn build_authorization_url(
    resolved: &ResolvedConfig,
    state: &str,
    redirect_uri: &str,
    nonce: &str,
) -> String {
    let options = &resolved.client.auth_request;
    let params = AuthorizationParams {
        client_id: resolved.client_id(),
        redirect_uri,
        scope: &resolved.scope,
        state,
        nonce,
        prompt: options.prompt.as_deref(),
        response_mode: options.response_mode.as_deref(),
        extra: &options.extra_params,
    };
    let query = encode_query(&params.to_pairs());

    let mut url = resolved.authorization_endpoint.clone();
    let combined = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
        _ => query,
    };
    url.set_query(Some(&combined));

    url.to_string()
}
