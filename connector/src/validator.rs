//! Identity token validation.
//!
//! # Validation Sequence
//!
//! Every step is mandatory and the first failure wins:
//!
//! 1. **Signature** against the provider's published JWKS
//! 2. **Issuer** equals the configured issuer exactly
//! 3. **Audience** contains the client identifier
//! 4. **Expiration** is in the future (explicit clock skew only)
//! 5. **Nonce** equals the nonce stored in the flow session
//!
//! All failures surface as [`ConnectorError::InvalidIdToken`] and are never
//! downgraded: each one may indicate a forged or replayed token.

use crate::config::ResolvedConfig;
use crate::error::{ConnectorError, Result};
use crate::providers::HttpTransport;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::instrument;

/// `aud` claim: a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Check if the audience contains `value`.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(aud) => aud == value,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == value),
        }
    }

    /// Returns `true` if more than one audience is present.
    #[must_use]
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(auds) if auds.len() > 1)
    }
}

/// Claims decoded from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    /// Subject identifier.
    pub sub: String,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: Audience,

    /// Expiration (seconds since the Unix epoch).
    pub exp: i64,

    /// Issued at (seconds since the Unix epoch).
    #[serde(default)]
    pub iat: Option<i64>,

    /// Nonce echoed from the authorization request.
    #[serde(default)]
    pub nonce: Option<String>,

    /// Authorized party.
    #[serde(default)]
    pub azp: Option<String>,

    /// Full name.
    #[serde(default)]
    pub name: Option<String>,

    /// Profile picture URL.
    #[serde(default)]
    pub picture: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the provider verified `email`.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub email_verified: bool,

    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Whether the provider verified `phone_number`.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub phone_number_verified: bool,
}

/// Accepts `true` and `"true"` as verified; any other value means unverified.
///
/// Some providers encode verification flags as strings. Numbers, objects
/// and `null` never fail the token, they only drop the contact claim.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum VerifiedFlag {
        Bool(bool),
        String(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<VerifiedFlag>::deserialize(deserializer)? {
        Some(VerifiedFlag::Bool(value)) => value,
        Some(VerifiedFlag::String(value)) => value.eq_ignore_ascii_case("true"),
        Some(VerifiedFlag::Other(_)) | None => false,
    })
}

#[derive(Deserialize)]
struct RawJwkSet {
    #[serde(default)]
    keys: Vec<serde_json::Value>,
}

fn invalid(reason: impl Into<String>) -> ConnectorError {
    let reason = reason.into();
    tracing::warn!(reason = %reason, "ID token rejected");
    ConnectorError::InvalidIdToken(reason)
}

const fn is_symmetric(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn key_matches_algorithm(jwk: &Jwk, alg: Algorithm) -> bool {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(_) => matches!(alg, Algorithm::ES256 | Algorithm::ES384),
        AlgorithmParameters::OctetKeyPair(_) => alg == Algorithm::EdDSA,
        AlgorithmParameters::OctetKey(_) => false,
    }
}

/// Pick the verification key for a token header.
///
/// With a `kid` the key must match it; without one, the key set must hold
/// exactly one key compatible with `alg`.
fn select_key(keys: &[Jwk], kid: Option<&str>, alg: Algorithm) -> Result<DecodingKey> {
    let candidates: Vec<&Jwk> = keys
        .iter()
        .filter(|jwk| key_matches_algorithm(jwk, alg))
        .filter(|jwk| kid.is_none_or(|kid| jwk.common.key_id.as_deref() == Some(kid)))
        .collect();

    let jwk = match candidates.as_slice() {
        [jwk] => *jwk,
        [] => return Err(invalid(format!("No signing key found for kid {kid:?}"))),
        _ => return Err(invalid("Signing key is ambiguous")),
    };

    DecodingKey::from_jwk(jwk).map_err(|e| invalid(format!("Unusable signing key: {e}")))
}

/// Fetch the provider's key set and verify the token signature.
///
/// Only the signature is checked here; claim checks follow in [`check_claims`].
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidIdToken`] if the header is malformed, the
/// algorithm is not allowed, no key matches, the key set is unreachable, the
/// signature does not verify, or the verified payload lacks required claims.
#[instrument(skip_all, fields(jwks_uri = %resolved.jwks_uri))]
pub async fn verify_signature<T: HttpTransport>(
    id_token: &str,
    resolved: &ResolvedConfig,
    transport: &T,
) -> Result<IdentityClaims> {
    let header = decode_header(id_token).map_err(|e| invalid(format!("Malformed token header: {e}")))?;

    if is_symmetric(header.alg) || !resolved.client.verification.algorithms.contains(&header.alg) {
        return Err(invalid(format!("Signing algorithm {:?} is not allowed", header.alg)));
    }

    let response = transport
        .get(resolved.jwks_uri.as_str())
        .await
        .map_err(|e| invalid(format!("Key set unavailable: {e}")))?;

    if !response.is_success() {
        return Err(invalid(format!("Key set returned status {}", response.status)));
    }

    let raw: RawJwkSet =
        serde_json::from_str(&response.body).map_err(|e| invalid(format!("Malformed key set: {e}")))?;
    // Keys of unsupported types are skipped rather than failing the whole set.
    let keys: Vec<Jwk> = raw
        .keys
        .into_iter()
        .filter_map(|key| serde_json::from_value(key).ok())
        .collect();

    let key = select_key(&keys, header.kid.as_deref(), header.alg)?;

    let mut validation = Validation::new(header.alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let payload = decode::<serde_json::Value>(id_token, &key, &validation)
        .map_err(|e| invalid(format!("Signature verification failed: {e}")))?
        .claims;

    // Signed by the provider but not an identity token we can use
    serde_json::from_value(payload).map_err(|e| invalid(format!("Malformed claims: {e}")))
}

/// Check issuer, audience, expiration and nonce of verified claims.
///
/// `now` is seconds since the Unix epoch.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidIdToken`] naming the first failed check.
pub fn check_claims(
    claims: &IdentityClaims,
    resolved: &ResolvedConfig,
    expected_nonce: &str,
    now: i64,
) -> Result<()> {
    if claims.iss != resolved.issuer() {
        return Err(invalid(format!(
            "Issuer mismatch: expected {}, got {}",
            resolved.issuer(),
            claims.iss
        )));
    }

    let client_id = resolved.client_id();
    if !claims.aud.contains(client_id) {
        return Err(invalid("Audience does not contain client id"));
    }

    if claims.aud.is_multiple() {
        if let Some(azp) = claims.azp.as_deref() {
            if azp != client_id {
                return Err(invalid("Authorized party does not match client id"));
            }
        }
    }

    let skew = resolved.client.verification.clock_skew.num_seconds();
    if now >= claims.exp.saturating_add(skew) {
        return Err(invalid("Token has expired"));
    }

    let Some(nonce) = claims.nonce.as_deref() else {
        return Err(invalid("Token has no nonce"));
    };

    if !constant_time_eq::constant_time_eq(nonce.as_bytes(), expected_nonce.as_bytes()) {
        return Err(invalid("Nonce mismatch"));
    }

    Ok(())
}

/// Validate an identity token and return its claims.
///
/// Runs [`verify_signature`] then [`check_claims`] against the current time.
/// The only side effect is the key set fetch.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidIdToken`] on the first failed step.
pub async fn validate<T: HttpTransport>(
    id_token: &str,
    resolved: &ResolvedConfig,
    expected_nonce: &str,
    transport: &T,
) -> Result<IdentityClaims> {
    let claims = verify_signature(id_token, resolved, transport).await?;
    check_claims(&claims, resolved, expected_nonce, chrono::Utc::now().timestamp())?;

    tracing::info!(subject = %claims.sub, issuer = %claims.iss, "ID token verified");

    Ok(claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConnectorConfig;
    use crate::mocks::{MockHttpTransport, TestSigner};
    use chrono::Duration;
    use serde_json::{json, Value};
    use url::Url;

    const JWKS_URL: &str = "https://idp.example/jwks";
    const NOW: i64 = 1_700_000_000;

    fn resolved(config: ConnectorConfig) -> ResolvedConfig {
        ResolvedConfig {
            scope: config.effective_scope(),
            client: config,
            authorization_endpoint: Url::parse("https://idp.example/authorize").unwrap(),
            token_endpoint: Url::parse("https://idp.example/token").unwrap(),
            jwks_uri: Url::parse(JWKS_URL).unwrap(),
            userinfo_endpoint: None,
            scopes_supported: vec![],
        }
    }

    fn config() -> ConnectorConfig {
        ConnectorConfig::new(
            "c1".to_string(),
            "secret".to_string(),
            "https://idp.example/oidc".to_string(),
        )
    }

    fn claims_json() -> Value {
        json!({
            "sub": "user-1",
            "iss": "https://idp.example/oidc",
            "aud": "c1",
            "exp": NOW + 300,
            "iat": NOW,
            "nonce": "n1",
            "email": "a@b.com",
            "email_verified": true,
        })
    }

    fn claims(value: Value) -> IdentityClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_check_claims_accepts_valid_claims() {
        assert!(check_claims(&claims(claims_json()), &resolved(config()), "n1", NOW).is_ok());
    }

    #[test]
    fn test_issuer_must_match_exactly() {
        let mut value = claims_json();
        value["iss"] = json!("https://idp.example/oidc/");

        let result = check_claims(&claims(value), &resolved(config()), "n1", NOW);

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("Issuer")));
    }

    #[test]
    fn test_audience_array() {
        let mut value = claims_json();
        value["aud"] = json!(["other", "c1"]);
        assert!(check_claims(&claims(value.clone()), &resolved(config()), "n1", NOW).is_ok());

        value["aud"] = json!(["other"]);
        assert!(check_claims(&claims(value), &resolved(config()), "n1", NOW).is_err());
    }

    #[test]
    fn test_azp_must_match_for_multiple_audiences() {
        let mut value = claims_json();
        value["aud"] = json!(["other", "c1"]);
        value["azp"] = json!("other");

        let result = check_claims(&claims(value), &resolved(config()), "n1", NOW);

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("Authorized party")));
    }

    #[test]
    fn test_expiration_boundary() {
        let value = claims_json();
        let exp = NOW + 300;

        assert!(check_claims(&claims(value.clone()), &resolved(config()), "n1", exp - 1).is_ok());
        assert!(check_claims(&claims(value.clone()), &resolved(config()), "n1", exp).is_err());

        // Explicit skew extends the window, nothing implicit does
        let skewed = resolved(config().with_clock_skew(Duration::seconds(30)));
        assert!(check_claims(&claims(value.clone()), &skewed, "n1", exp + 29).is_ok());
        assert!(check_claims(&claims(value), &skewed, "n1", exp + 30).is_err());
    }

    #[test]
    fn test_nonce_must_match_and_be_present() {
        let result = check_claims(&claims(claims_json()), &resolved(config()), "n2", NOW);
        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("Nonce")));

        let mut value = claims_json();
        value.as_object_mut().unwrap().remove("nonce");
        let result = check_claims(&claims(value), &resolved(config()), "n1", NOW);
        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("no nonce")));
    }

    #[test]
    fn test_verified_flags_accept_strings() {
        let mut value = claims_json();
        value["email_verified"] = json!("true");
        value["phone_number_verified"] = json!("False");
        value["phone_number"] = json!("+15550100");

        let parsed = claims(value);

        assert!(parsed.email_verified);
        assert!(!parsed.phone_number_verified);
    }

    #[test]
    fn test_verified_flags_default_false() {
        let mut value = claims_json();
        value["email_verified"] = Value::Null;

        let parsed = claims(value);

        assert!(!parsed.email_verified);
        assert!(!parsed.phone_number_verified);
    }

    #[test]
    fn test_non_boolean_verified_flags_mean_unverified() {
        let mut value = claims_json();
        value["email_verified"] = json!(1);
        value["phone_number_verified"] = json!({ "source": "sms" });

        let parsed = claims(value);

        assert!(!parsed.email_verified);
        assert!(!parsed.phone_number_verified);
    }

    #[tokio::test]
    async fn test_verify_signature_reports_malformed_claims() {
        let signer = TestSigner::new();
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &signer.jwks());
        let mut value = claims_json();
        value.as_object_mut().unwrap().remove("sub");

        let result = verify_signature(&signer.sign(&value), &resolved(config()), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.starts_with("Malformed claims")));
    }

    #[tokio::test]
    async fn test_verify_signature_with_published_key() {
        let signer = TestSigner::new();
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &signer.jwks());
        let token = signer.sign(&claims_json());

        let verified = verify_signature(&token, &resolved(config()), &transport).await.unwrap();

        assert_eq!(verified.sub, "user-1");
        assert_eq!(verified.nonce.as_deref(), Some("n1"));
    }

    #[tokio::test]
    async fn test_verify_signature_without_kid_uses_single_key() {
        let signer = TestSigner::new();
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &signer.jwks());
        let token = signer.sign_with_header(&claims_json(), None);

        assert!(verify_signature(&token, &resolved(config()), &transport).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_signature_rejects_foreign_key() {
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &TestSigner::new().jwks());
        let token = TestSigner::rogue().sign(&claims_json());

        let result = verify_signature(&token, &resolved(config()), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("Signature")));
    }

    #[tokio::test]
    async fn test_verify_signature_rejects_unknown_kid() {
        let signer = TestSigner::new();
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &signer.jwks());
        let token = signer.sign_with_header(&claims_json(), Some("rotated".to_string()));

        let result = verify_signature(&token, &resolved(config()), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("No signing key")));
    }

    #[tokio::test]
    async fn test_verify_signature_rejects_disallowed_algorithm() {
        let signer = TestSigner::new();
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &signer.jwks());
        let token = signer.sign(&claims_json());

        let strict = resolved(config().with_algorithms(vec![Algorithm::RS256]));
        let result = verify_signature(&token, &strict, &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(msg)) if msg.contains("not allowed")));
        // Algorithm is checked before any key fetch
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_verify_signature_skips_unsupported_keys() {
        let signer = TestSigner::new();
        let jwks = json!({ "keys": [{ "kty": "unknown", "kid": "x" }, signer.jwk()] });
        let transport = MockHttpTransport::new().with_json(JWKS_URL, &jwks);

        assert!(verify_signature(&signer.sign(&claims_json()), &resolved(config()), &transport)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_key_set_is_invalid_id_token() {
        let transport = MockHttpTransport::new();
        let token = TestSigner::new().sign(&claims_json());

        let result = verify_signature(&token, &resolved(config()), &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(_))));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid_id_token() {
        let transport = MockHttpTransport::new();

        let result = validate("not-a-jwt", &resolved(config()), "n1", &transport).await;

        assert!(matches!(result, Err(ConnectorError::InvalidIdToken(_))));
    }
}
