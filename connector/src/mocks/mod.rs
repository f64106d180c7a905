//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests, plus a token signer with fixed keys.

pub mod session;
pub mod signer;
pub mod transport;

pub use session::MockFlowSessionStore;
pub use signer::TestSigner;
pub use transport::{MockHttpTransport, RecordedRequest};
