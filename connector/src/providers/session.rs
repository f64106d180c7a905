//! Flow session storage trait.
//!
//! A [`FlowSession`] carries the nonce from the authorization redirect to the
//! callback. The connector writes it exactly once and never reads it back;
//! the caller recovers it at callback time and deletes it afterwards.
//!
//! # Security
//!
//! Flow sessions must be:
//! - **Single-use**: Consumed atomically to prevent replay attacks
//! - **Ephemeral**: Expire after a few minutes (store policy)
//! - **Correlated**: Keyed by the caller's `state`
//!
//! # Example
//!
//! ```ignore
//! // Authorization: the connector calls `store` for you.
//! let url = connector.begin_authorization("st1", "https://app.example/cb", "conn1").await?;
//!
//! // Callback: recover and consume the session, then complete the flow.
//! let Some(session) = store.consume(&state).await? else {
//!     return Err(ConnectorError::StateMismatch);
//! };
//! let user = connector.complete_authorization(&session, payload).await?;
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Per-attempt state persisted between authorization and callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSession {
    /// Nonce sent to the provider; must reappear in the ID token.
    pub nonce: String,

    /// Redirect URI used in the authorization request.
    pub redirect_uri: String,

    /// Connector that started the flow.
    pub connector_id: String,

    /// Caller supplied state (CSRF / correlation token).
    pub state: String,
}

/// External flow session store.
///
/// # Implementation Notes
///
/// **Production** (`Redis`):
/// ```ignore
/// // Store: SET key value EX ttl_seconds NX
/// // Consume: GETDEL key (atomic get-and-delete)
/// ```
///
/// **Testing**: in-memory `HashMap` behind a `Mutex`.
pub trait FlowSessionStore: Send + Sync {
    /// Persist a new flow session, keyed by its `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SessionStore`](crate::ConnectorError::SessionStore)
    /// if storage fails.
    fn store(&self, session: &FlowSession) -> impl Future<Output = Result<()>> + Send;

    /// Atomically read and remove the flow session for `state`.
    ///
    /// Returns `None` if it does not exist, already was consumed, or expired.
    ///
    /// # Errors
    ///
    /// Returns error only on storage failures.
    fn consume(&self, state: &str) -> impl Future<Output = Result<Option<FlowSession>>> + Send;

    /// Remove the flow session for `state` (not found is OK).
    ///
    /// # Errors
    ///
    /// Returns error if deletion fails.
    fn delete(&self, state: &str) -> impl Future<Output = Result<()>> + Send;
}
