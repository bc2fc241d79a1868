//! Cadence, overlap control and stop policy for snapshot polling.
//!
//! The scheduler never touches a timer or the network itself. The driver
//! asks it whether a tick may fetch ([`PollingScheduler::begin_tick`]),
//! performs the fetch, and reports back ([`PollingScheduler::complete_tick`]).
//! The repeating timer handle `R` is owned here so that every path out of
//! `Running` drops it, which cancels the repetition.

use std::time::Duration;

use crate::{
    error::ClientError,
    session::{GridSnapshot, LifecycleState, SessionHandle, SessionStore, StopReason},
    termination,
};

/// Permission for exactly one fetch, issued by [`PollingScheduler::begin_tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickTicket {
    id: u64,
    run: u64,
    handle: SessionHandle,
}

impl TickTicket {
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Snapshot applied; the burnt-fraction sample it produced
    Applied(f64),
    /// Snapshot applied and no cell is burning any more; the run stopped
    Terminated(f64),
    /// Fetch failed; the streak has not reached the limit yet
    Failed { consecutive: u32 },
    /// The failure streak hit the limit and the run stopped
    Degraded,
    /// The service no longer knows the session and the run stopped
    SessionLost,
    /// The result belongs to a run or session that is no longer current
    Discarded,
}

impl TickOutcome {
    pub fn stopped_run(&self) -> bool {
        matches!(
            self,
            TickOutcome::Terminated(_) | TickOutcome::Degraded | TickOutcome::SessionLost
        )
    }
}

pub struct PollingScheduler<R> {
    sim_speed: f64,
    interval: Duration,
    failure_limit: u32,
    /// Cancellation token for the repeating timer
    repeat: Option<R>,
    in_flight: Option<u64>,
    next_ticket: u64,
    run: u64,
    consecutive_failures: u32,
    skipped_ticks: u64,
}

impl<R> PollingScheduler<R> {
    pub fn new(sim_speed: f64, failure_limit: u32) -> Result<Self, ClientError> {
        let interval = poll_interval(sim_speed)?;
        Ok(Self {
            sim_speed,
            interval,
            failure_limit: failure_limit.max(1),
            repeat: None,
            in_flight: None,
            next_ticket: 0,
            run: 0,
            consecutive_failures: 0,
            skipped_ticks: 0,
        })
    }

    pub fn sim_speed(&self) -> f64 {
        self.sim_speed
    }

    /// Time between ticks: one second divided by the speed.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Enter `Running` and clear the metrics series. Returns the interval
    /// the driver should arm the timer with.
    pub fn start(&mut self, store: &mut SessionStore) -> Result<Duration, ClientError> {
        store.begin_run()?;
        self.repeat = None;
        self.run += 1;
        self.consecutive_failures = 0;
        let interval = self.interval();
        log::info!(
            "polling started, every {}",
            humantime::format_duration(interval)
        );
        Ok(interval)
    }

    /// Take ownership of the repeating timer. Replacing a previous one
    /// cancels it.
    pub fn arm(&mut self, repeat: R) {
        self.repeat = Some(repeat);
    }

    /// Change the polling rate. While running, returns the new interval the
    /// driver must re-arm with; ticks already scheduled are not affected.
    pub fn set_speed(
        &mut self,
        sim_speed: f64,
        state: LifecycleState,
    ) -> Result<Option<Duration>, ClientError> {
        self.interval = poll_interval(sim_speed)?;
        self.sim_speed = sim_speed;
        if state == LifecycleState::Running {
            let interval = self.interval();
            log::debug!(
                "polling rescheduled, every {}",
                humantime::format_duration(interval)
            );
            Ok(Some(interval))
        } else {
            Ok(None)
        }
    }

    /// Decide whether this tick may fetch. At most one fetch is outstanding
    /// at a time; a tick that finds one still in flight is skipped.
    pub fn begin_tick(&mut self, store: &SessionStore) -> Option<TickTicket> {
        if store.state() != LifecycleState::Running {
            return None;
        }
        let handle = store.handle()?.clone();
        if self.in_flight.is_some() {
            self.skipped_ticks += 1;
            log::debug!("previous fetch still in flight, skipping tick");
            return None;
        }
        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        Some(TickTicket {
            id: self.next_ticket,
            run: self.run,
            handle,
        })
    }

    pub fn complete_tick(
        &mut self,
        store: &mut SessionStore,
        ticket: TickTicket,
        result: Result<GridSnapshot, ClientError>,
    ) -> TickOutcome {
        if self.in_flight == Some(ticket.id) {
            self.in_flight = None;
        }
        if ticket.run != self.run || store.state() != LifecycleState::Running {
            log::debug!("discarding result of fetch {} from a finished run", ticket.id);
            return TickOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => {
                self.consecutive_failures = 0;
                let sample = match store.apply_snapshot(&ticket.handle, snapshot) {
                    Ok(Some(sample)) => sample,
                    Ok(None) | Err(_) => return TickOutcome::Discarded,
                };
                let terminal = store.snapshot().is_some_and(termination::is_terminal);
                if terminal {
                    self.stop(store, StopReason::Terminated);
                    TickOutcome::Terminated(sample)
                } else {
                    TickOutcome::Applied(sample)
                }
            }
            Err(ClientError::SessionNotFound(handle)) => {
                log::warn!("session {handle} vanished from the service");
                self.stop(store, StopReason::SessionNotFound);
                TickOutcome::SessionLost
            }
            Err(e) => {
                self.consecutive_failures += 1;
                log::warn!(
                    "fetch failed ({}/{}): {e}",
                    self.consecutive_failures,
                    self.failure_limit
                );
                if self.consecutive_failures >= self.failure_limit {
                    self.stop(store, StopReason::DegradedConnection);
                    TickOutcome::Degraded
                } else {
                    TickOutcome::Failed {
                        consecutive: self.consecutive_failures,
                    }
                }
            }
        }
    }

    /// Cancel the timer and leave `Running`. Snapshot and metrics stay as
    /// they are. Returns the reason only if this call stopped the run.
    pub fn stop(&mut self, store: &mut SessionStore, reason: StopReason) -> Option<StopReason> {
        self.repeat = None;
        if !store.halt(reason) {
            return None;
        }
        log::info!(
            "polling stopped ({reason}) after {} samples",
            store.metrics().len()
        );
        Some(reason)
    }

    /// Forget everything tied to the current session.
    pub fn reset(&mut self) {
        self.repeat = None;
        self.in_flight = None;
        self.consecutive_failures = 0;
        self.run += 1;
    }
}

fn poll_interval(sim_speed: f64) -> Result<Duration, ClientError> {
    if !(sim_speed.is_finite() && sim_speed > 0.0) {
        return Err(ClientError::InvalidConfiguration(format!(
            "simulation speed must be positive, got {sim_speed}"
        )));
    }
    Duration::try_from_secs_f64(1.0 / sim_speed).map_err(|_| {
        ClientError::InvalidConfiguration(format!("simulation speed {sim_speed} is too slow"))
    })
}
