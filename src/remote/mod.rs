//! Contract with the remote fire-spread engine.

use crate::{
    error::ClientError,
    session::{GridSnapshot, SessionHandle, SimulationConfiguration},
};

pub mod http;
pub mod wire;

pub use http::HttpSimulationService;

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedSession {
    pub handle: SessionHandle,
    pub snapshot: GridSnapshot,
}

/// The two calls the controller needs from the simulation service.
///
/// Futures are polled on a single-threaded event loop and need not be `Send`.
/// Neither call is retried by the implementation.
#[allow(async_fn_in_trait)]
pub trait SimulationService {
    /// Fails with [`ClientError::InvalidConfiguration`] when the service
    /// rejects the parameters and [`ClientError::ServiceUnavailable`] when
    /// it cannot be reached.
    async fn create_session(
        &self,
        config: &SimulationConfiguration,
    ) -> Result<CreatedSession, ClientError>;

    /// Fails with [`ClientError::SessionNotFound`] when the handle is no
    /// longer known and [`ClientError::ServiceUnavailable`] otherwise.
    async fn fetch_snapshot(&self, handle: &SessionHandle) -> Result<GridSnapshot, ClientError>;
}
