//! The OIDC connector.
//!
//! # Flow
//!
//! ```text
//! begin_authorization:    discovery → nonce → store(FlowSession) → authorization URL
//! complete_authorization: discovery → token exchange → ID token validation → UserInfo
//! ```
//!
//! The connector holds only immutable configuration and its collaborators, so
//! concurrent flows never interfere with each other.

use crate::authorization::{build_authorization_url, generate_nonce};
use crate::claims::{map_claims, UserInfo};
use crate::config::{ConnectorConfig, ResolvedConfig};
use crate::error::{ConnectorError, Result};
use crate::providers::{FlowSession, FlowSessionStore, HttpTransport};
use crate::{discovery, token, validator};
use tracing::instrument;

/// Client-side OIDC single sign-on connector.
///
/// # Example
///
/// ```no_run
/// use oidc_sso_connector::mocks::MockFlowSessionStore;
/// use oidc_sso_connector::providers::ReqwestTransport;
/// use oidc_sso_connector::{ConnectorConfig, OidcConnector};
///
/// # async fn run() -> oidc_sso_connector::Result<()> {
/// let config = ConnectorConfig::from_env()?;
/// let connector = OidcConnector::new(config, ReqwestTransport::new())
///     .with_session_store(MockFlowSessionStore::new());
///
/// let url = connector
///     .begin_authorization("st1", "https://app.example/cb", "conn1")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OidcConnector<T, S> {
    config: ConnectorConfig,
    transport: T,
    session_store: Option<S>,
}

impl<T, S> OidcConnector<T, S>
where
    T: HttpTransport,
    S: FlowSessionStore,
{
    /// Create a connector without a flow session store.
    ///
    /// [`Self::begin_authorization`] fails with
    /// [`ConnectorError::NotImplemented`] until a store is configured.
    #[must_use]
    pub const fn new(config: ConnectorConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session_store: None,
        }
    }

    /// Configure the store that receives each [`FlowSession`].
    #[must_use]
    pub fn with_session_store(mut self, store: S) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Static configuration.
    #[must_use]
    pub const fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Discover provider metadata and merge it with the static configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidConfig`] on any discovery failure.
    pub async fn resolve_config(&self) -> Result<ResolvedConfig> {
        discovery::resolve(&self.config, &self.transport).await
    }

    /// Start a sign-in: persist a flow session and return the authorization URL.
    ///
    /// # Arguments
    ///
    /// * `state` - Caller supplied CSRF / correlation token
    /// * `redirect_uri` - Redirect URI registered with the provider
    /// * `connector_id` - Identifier of this connector record
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::NotImplemented`] if no session store is configured
    ///   (checked before any network call)
    /// - [`ConnectorError::InvalidConfig`] if discovery fails
    /// - [`ConnectorError::SessionStore`] if the session cannot be persisted
    #[instrument(skip(self, state))]
    pub async fn begin_authorization(
        &self,
        state: &str,
        redirect_uri: &str,
        connector_id: &str,
    ) -> Result<String> {
        let Some(store) = self.session_store.as_ref() else {
            tracing::error!("No flow session store configured");
            return Err(ConnectorError::NotImplemented("flow session store"));
        };

        let resolved = self.resolve_config().await?;
        let nonce = generate_nonce();

        store
            .store(&FlowSession {
                nonce: nonce.clone(),
                redirect_uri: redirect_uri.to_string(),
                connector_id: connector_id.to_string(),
                state: state.to_string(),
            })
            .await?;

        let url = build_authorization_url(&resolved, state, redirect_uri, &nonce);
        tracing::debug!(authorization_endpoint = %resolved.authorization_endpoint, "Authorization URL built");

        Ok(url)
    }

    /// Finish a sign-in from the provider's callback.
    ///
    /// `session` is the [`FlowSession`] the caller recovered for this flow.
    /// The caller must delete it afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::InvalidConfig`] if discovery fails
    /// - [`ConnectorError::StateMismatch`] if the callback `state` belongs to
    ///   another flow
    /// - [`ConnectorError::InvalidAuthCode`], [`ConnectorError::ProviderError`]
    ///   or [`ConnectorError::InvalidAccessToken`] if the code exchange fails
    /// - [`ConnectorError::InvalidIdToken`] if the identity token is rejected
    #[instrument(skip_all, fields(connector_id = %session.connector_id))]
    pub async fn complete_authorization(
        &self,
        session: &FlowSession,
        payload: &serde_json::Value,
    ) -> Result<UserInfo> {
        let resolved = self.resolve_config().await?;

        let callback = token::parse_callback(payload)?;
        if let Some(returned) = callback.state.as_deref() {
            if !constant_time_eq::constant_time_eq(returned.as_bytes(), session.state.as_bytes()) {
                tracing::warn!("Callback state does not match flow session");
                return Err(ConnectorError::StateMismatch);
            }
        }

        let tokens = token::exchange_code(&resolved, payload, &session.redirect_uri, &self.transport).await?;
        let claims = validator::validate(&tokens.id_token, &resolved, &session.nonce, &self.transport).await?;

        Ok(map_claims(&claims))
    }
}
