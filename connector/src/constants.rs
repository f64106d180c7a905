//! Protocol constants.
//!
//! Wire parameter names live here so that the rest of the crate never spells
//! an OIDC parameter name inline.

/// Path appended to the issuer to locate the discovery document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Scope value that turns an OAuth 2.0 request into an OIDC request.
pub const OPENID_SCOPE: &str = "openid";

/// Scope requested when the operator does not configure one.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// The only response type this connector requests.
pub const RESPONSE_TYPE_CODE: &str = "code";

/// Grant type used at the token endpoint.
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// OAuth error code the provider returns for expired or replayed codes.
pub const ERROR_INVALID_GRANT: &str = "invalid_grant";

/// Bytes of randomness in a generated nonce (256 bits).
pub const NONCE_BYTES: usize = 32;

/// Query and form parameter names as they appear on the wire.
pub mod params {
    /// OAuth client identifier.
    pub const CLIENT_ID: &str = "client_id";
    /// OAuth client secret.
    pub const CLIENT_SECRET: &str = "client_secret";
    /// Requested response type.
    pub const RESPONSE_TYPE: &str = "response_type";
    /// Redirect URI registered with the provider.
    pub const REDIRECT_URI: &str = "redirect_uri";
    /// Space separated scope list.
    pub const SCOPE: &str = "scope";
    /// Caller supplied CSRF / correlation token.
    pub const STATE: &str = "state";
    /// Replay protection nonce.
    pub const NONCE: &str = "nonce";
    /// Optional `prompt` parameter.
    pub const PROMPT: &str = "prompt";
    /// Optional `response_mode` parameter.
    pub const RESPONSE_MODE: &str = "response_mode";
    /// Token endpoint grant type.
    pub const GRANT_TYPE: &str = "grant_type";
    /// Authorization code.
    pub const CODE: &str = "code";
}
