//! Single source of truth for one client: the configuration being edited,
//! the active session, its latest snapshot, lifecycle state and metrics.

use crate::error::ClientError;

use super::{
    GridSnapshot, LifecycleState, MetricsSeries, SessionHandle, SimulationConfiguration,
    StopReason,
};

struct ActiveSession {
    handle: SessionHandle,
    /// Frozen copy of the configuration the session was created with
    config: SimulationConfiguration,
}

#[derive(Default)]
pub struct SessionStore {
    pending: SimulationConfiguration,
    active: Option<ActiveSession>,
    snapshot: Option<GridSnapshot>,
    state: LifecycleState,
    metrics: MetricsSeries,
    stop_reason: Option<StopReason>,
}

impl SessionStore {
    /// Validate and keep `config` for the next setup. A session that is
    /// already active keeps the configuration it was created with.
    pub fn configure(
        &mut self,
        config: SimulationConfiguration,
    ) -> Result<SimulationConfiguration, ClientError> {
        config.validate()?;
        log::debug!("pending configuration updated: {config:?}");
        self.pending = config.clone();
        Ok(config)
    }

    pub fn pending_config(&self) -> &SimulationConfiguration {
        &self.pending
    }

    pub fn active_config(&self) -> Option<&SimulationConfiguration> {
        self.active.as_ref().map(|a| &a.config)
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    pub fn snapshot(&self) -> Option<&GridSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn metrics(&self) -> &MetricsSeries {
        &self.metrics
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Record a freshly created session and its first snapshot.
    pub fn install_session(
        &mut self,
        handle: SessionHandle,
        config: SimulationConfiguration,
        initial: GridSnapshot,
    ) {
        if !initial.matches_dimensions(config.grid_width, config.grid_height) {
            log::warn!(
                "session {handle} returned {} cells for a {}x{} grid",
                initial.len(),
                config.grid_width,
                config.grid_height
            );
        }
        log::info!("session {handle} configured with {} cells", initial.len());
        self.active = Some(ActiveSession { handle, config });
        self.snapshot = Some(initial);
        self.metrics.clear();
        self.stop_reason = None;
        self.state = LifecycleState::Configured;
    }

    /// Replace the current snapshot with one fetched for `handle`. Returns
    /// the metrics sample it produced, which only happens while running.
    pub fn apply_snapshot(
        &mut self,
        handle: &SessionHandle,
        snapshot: GridSnapshot,
    ) -> Result<Option<f64>, ClientError> {
        if self.handle() != Some(handle) {
            log::debug!("discarding snapshot fetched for superseded session {handle}");
            return Err(ClientError::StaleSnapshotDiscarded);
        }
        let sample = if self.state == LifecycleState::Running {
            let fraction = snapshot.burnt_fraction();
            self.metrics.push(fraction);
            Some(fraction)
        } else {
            None
        };
        self.snapshot = Some(snapshot);
        Ok(sample)
    }

    /// Forget the current session entirely.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            log::debug!("releasing session {}", active.handle);
        }
        self.snapshot = None;
        self.metrics.clear();
        self.stop_reason = None;
        self.state = LifecycleState::Idle;
    }

    pub(crate) fn begin_run(&mut self) -> Result<(), ClientError> {
        let startable = matches!(
            self.state,
            LifecycleState::Configured | LifecycleState::Stopped
        );
        // a session the service reported missing stays dead until the next setup
        let expired = self.stop_reason == Some(StopReason::SessionNotFound);
        if !startable || expired || self.active.is_none() {
            return Err(ClientError::InvalidTransition {
                from: self.state,
                action: "start polling",
            });
        }
        self.metrics.clear();
        self.stop_reason = None;
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Leave `Running`. Returns false, changing nothing, in any other state.
    pub(crate) fn halt(&mut self, reason: StopReason) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        self.state = LifecycleState::Stopped;
        self.stop_reason = Some(reason);
        true
    }
}
