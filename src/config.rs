use std::time::Duration;

use crate::rendering::CanvasLayout;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client-side knobs that never reach the remote engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientSettings {
    /// Where the simulation service listens
    pub base_url: String,
    /// Initial polling rate in ticks per second
    pub sim_speed: f64,
    /// Consecutive failed fetches tolerated before a run is stopped
    pub failure_limit: u32,
    /// Per-request timeout. Ignored in the browser, where `fetch` has none.
    pub request_timeout: Duration,
    pub layout: CanvasLayout,
}

impl ClientSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_sim_speed(mut self, sim_speed: f64) -> Self {
        self.sim_speed = sim_speed;
        self
    }

    pub fn with_failure_limit(mut self, failure_limit: u32) -> Self {
        self.failure_limit = failure_limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            sim_speed: 2.0,
            failure_limit: 3,
            request_timeout: Duration::from_secs(5),
            layout: CanvasLayout::default(),
        }
    }
}
