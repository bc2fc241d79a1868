use std::fmt;

mod config;
mod snapshot;
pub mod store;

pub use config::SimulationConfiguration;
pub use snapshot::{Cell, CellStatus, GridSnapshot};
pub use store::SessionStore;

/// Resource locator the service hands out for a created session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL snapshots are fetched from. Relative locators hang off
    /// `base_url`, absolute ones are kept as they are.
    pub fn resolve(&self, base_url: &str) -> String {
        if self.0.starts_with("http://") || self.0.starts_with("https://") {
            return self.0.clone();
        }
        let base = base_url.trim_end_matches('/');
        if self.0.starts_with('/') {
            format!("{base}{}", self.0)
        } else {
            format!("{base}/{}", self.0)
        }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// No session created
    #[default]
    Idle,
    /// Session created and initial snapshot available, not polling yet
    Configured,
    Running,
    /// Polling cancelled by the user or by the scheduler itself
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Configured => "configured",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
        })
    }
}

/// Why a run left the `Running` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    User,
    /// No cell is burning any more
    Terminated,
    /// Too many consecutive failed fetches
    DegradedConnection,
    SessionNotFound,
}

impl StopReason {
    /// Whether the UI should tell the user something went wrong.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::DegradedConnection | StopReason::SessionNotFound
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::User => "stopped by user",
            StopReason::Terminated => "fire burnt out",
            StopReason::DegradedConnection => "connection to the simulation service degraded",
            StopReason::SessionNotFound => "simulation session no longer exists",
        })
    }
}

/// Burnt fraction sampled once per successful poll of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsSeries {
    samples: Vec<f64>,
}

impl MetricsSeries {
    pub(crate) fn push(&mut self, sample: f64) {
        self.samples.push(sample);
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    pub fn is_non_decreasing(&self) -> bool {
        self.samples.windows(2).all(|w| w[0] <= w[1])
    }
}
