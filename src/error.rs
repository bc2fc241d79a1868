use thiserror::Error;

use crate::session::{LifecycleState, SessionHandle};

/// Errors surfaced by the session controller and the remote service client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Parameters rejected locally or by the service. Raised before any
    /// session exists.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Transport failure, server error or an unreadable response.
    #[error("simulation service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The session locator expired or never existed.
    #[error("session {0} not found")]
    SessionNotFound(SessionHandle),
    /// A snapshot fetched for a superseded session. Internal only.
    #[error("stale snapshot discarded")]
    StaleSnapshotDiscarded,
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: LifecycleState,
        action: &'static str,
    },
}
