//! Error types for the OIDC connector.

use thiserror::Error;

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Error taxonomy for every phase of the OIDC flow.
///
/// Variants are grouped by how the caller is expected to react: missing
/// collaborators are fatal, configuration failures need operator attention,
/// code-exchange failures restart the flow, and identity token failures are
/// treated as potential attacks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    // ═══════════════════════════════════════════════════════════
    // Wiring Errors
    // ═══════════════════════════════════════════════════════════

    /// A required collaborator was not configured.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Failure reported by the external flow session store.
    #[error("Flow session store error: {0}")]
    SessionStore(String),

    // ═══════════════════════════════════════════════════════════
    // Discovery Errors
    // ═══════════════════════════════════════════════════════════

    /// Discovery document unreachable, malformed, or missing required endpoints.
    #[error("Invalid connector configuration: {0}")]
    InvalidConfig(String),

    // ═══════════════════════════════════════════════════════════
    // Token Exchange Errors
    // ═══════════════════════════════════════════════════════════

    /// Authorization code missing or rejected by the provider.
    #[error("Invalid authorization code")]
    InvalidAuthCode,

    /// Token endpoint unreachable or returned an unusable response.
    #[error("Invalid access token response: {0}")]
    InvalidAccessToken(String),

    /// The provider answered with an OAuth 2.0 error.
    #[error("Provider error: {error}")]
    ProviderError {
        /// OAuth error code (e.g. `access_denied`)
        error: String,
        /// Optional human readable description from the provider
        description: Option<String>,
    },

    // ═══════════════════════════════════════════════════════════
    // Identity Token Errors
    // ═══════════════════════════════════════════════════════════

    /// Identity token failed signature or claim validation.
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    /// Callback `state` does not belong to the flow session (CSRF protection).
    #[error("Callback state does not match flow session")]
    StateMismatch,
}

impl ConnectorError {
    /// Returns `true` if the user should simply be asked to sign in again.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oidc_sso_connector::ConnectorError;
    /// assert!(ConnectorError::InvalidAuthCode.is_user_error());
    /// assert!(!ConnectorError::InvalidConfig("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidAuthCode | Self::ProviderError { .. })
    }

    /// Returns `true` if this error may indicate a forged or replayed response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oidc_sso_connector::ConnectorError;
    /// assert!(ConnectorError::InvalidIdToken("nonce".into()).is_security_issue());
    /// assert!(ConnectorError::StateMismatch.is_security_issue());
    /// assert!(!ConnectorError::InvalidAuthCode.is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::InvalidIdToken(_) | Self::StateMismatch)
    }
}
