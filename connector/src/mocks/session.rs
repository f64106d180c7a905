//! Mock flow session store for testing.

use crate::error::{ConnectorError, Result};
use crate::providers::{FlowSession, FlowSessionStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock flow session store.
///
/// In-memory implementation keyed by `state`.
///
/// **WARNING**: Do NOT use in production. This is for testing only!
#[derive(Debug, Clone)]
pub struct MockFlowSessionStore {
    sessions: Arc<Mutex<HashMap<String, FlowSession>>>,
    /// Whether to simulate success or failure.
    pub should_succeed: bool,
}

impl MockFlowSessionStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            should_succeed: true,
        }
    }

    /// Create a store whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Snapshot of the session stored for `state`, without consuming it.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn get(&self, state: &str) -> Option<FlowSession> {
        self.sessions.lock().unwrap().get(state).cloned()
    }

    /// Number of stored sessions.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockFlowSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowSessionStore for MockFlowSessionStore {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn store(&self, session: &FlowSession) -> Result<()> {
        if !self.should_succeed {
            return Err(ConnectorError::SessionStore("mock store unavailable".to_string()));
        }

        self.sessions
            .lock()
            .unwrap()
            .insert(session.state.clone(), session.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn consume(&self, state: &str) -> Result<Option<FlowSession>> {
        // Atomic get-and-remove
        Ok(self.sessions.lock().unwrap().remove(state))
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn delete(&self, state: &str) -> Result<()> {
        self.sessions.lock().unwrap().remove(state);
        Ok(())
    }
}
