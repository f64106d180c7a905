//! Shared fixtures for integration tests.

#![allow(dead_code)]

use oidc_sso_connector::mocks::{MockFlowSessionStore, MockHttpTransport, TestSigner};
use oidc_sso_connector::{ConnectorConfig, FlowSession, OidcConnector};
use serde_json::{json, Value};

pub const ISSUER: &str = "https://idp.example/oidc";
pub const WELL_KNOWN: &str = "https://idp.example/oidc/.well-known/openid-configuration";
pub const AUTHORIZE: &str = "https://idp.example/authorize";
pub const TOKEN: &str = "https://idp.example/token";
pub const JWKS: &str = "https://idp.example/jwks";
pub const CLIENT_ID: &str = "c1";
pub const REDIRECT_URI: &str = "https://app.example/cb";

pub type TestConnector = OidcConnector<MockHttpTransport, MockFlowSessionStore>;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig::new(CLIENT_ID.to_string(), "s3cret".to_string(), ISSUER.to_string())
        .with_scope("openid profile email")
}

pub fn discovery_document() -> Value {
    json!({
        "issuer": ISSUER,
        "authorization_endpoint": AUTHORIZE,
        "token_endpoint": TOKEN,
        "jwks_uri": JWKS,
    })
}

/// Provider serving discovery and the primary signer's key set.
pub fn provider() -> MockHttpTransport {
    MockHttpTransport::new()
        .with_json(WELL_KNOWN, &discovery_document())
        .with_json(JWKS, &TestSigner::new().jwks())
}

/// Provider whose token endpoint returns `id_token`.
pub fn provider_issuing(id_token: &str) -> MockHttpTransport {
    provider().with_post_json(
        TOKEN,
        200,
        &json!({
            "access_token": "at",
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": id_token,
        }),
    )
}

pub fn connector(transport: MockHttpTransport) -> TestConnector {
    OidcConnector::new(config(), transport).with_session_store(MockFlowSessionStore::new())
}

pub fn session(nonce: &str) -> FlowSession {
    FlowSession {
        nonce: nonce.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        connector_id: "conn1".to_string(),
        state: "st1".to_string(),
    }
}

/// Claims that pass every check for [`session`] with `nonce`.
pub fn valid_claims(nonce: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": "user-1",
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "iat": now,
        "exp": now + 600,
        "nonce": nonce,
        "name": "Ada Lovelace",
        "picture": "https://idp.example/ada.png",
        "email": "a@b.com",
        "email_verified": true,
        "phone_number": "+15550100",
        "phone_number_verified": false,
    })
}

pub fn callback() -> Value {
    json!({ "code": "auth-code-1", "state": "st1" })
}
