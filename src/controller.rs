//! Wires the session store, the polling scheduler and the remote service
//! onto a single-threaded event loop.
//!
//! All state lives behind one `RefCell` that is only borrowed between
//! suspension points, never across an `.await`.

use std::{cell::RefCell, rc::Rc, time::Duration};

use watch::{WatchReceiver, WatchSender};

use crate::{
    config::ClientSettings,
    error::ClientError,
    event_loop::EventLoop,
    remote::SimulationService,
    scheduler::{PollingScheduler, TickOutcome, TickTicket},
    session::{
        GridSnapshot, LifecycleState, MetricsSeries, SessionStore, SimulationConfiguration,
        StopReason,
    },
};

/// Everything the rendering surface needs to draw the client once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub state: LifecycleState,
    /// Grid size of the active session, `(width, height)`
    pub dimensions: Option<(u32, u32)>,
    pub snapshot: Option<GridSnapshot>,
    pub metrics: MetricsSeries,
    /// Set once the run is over; such a frame is the final aggregate view
    pub stop_reason: Option<StopReason>,
}

impl Frame {
    fn capture(store: &SessionStore) -> Self {
        Self {
            state: store.state(),
            dimensions: store
                .active_config()
                .map(|c| (c.grid_width, c.grid_height)),
            snapshot: store.snapshot().cloned(),
            metrics: store.metrics().clone(),
            stop_reason: store.stop_reason(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.stop_reason.is_some()
    }
}

struct Core<R> {
    store: SessionStore,
    scheduler: PollingScheduler<R>,
    /// Bumped on every setup so a superseded `create_session` is ignored
    setup_epoch: u64,
}

struct Shared<S, L: EventLoop> {
    service: S,
    event_loop: L,
    core: RefCell<Core<L::Repeat>>,
    frames: WatchSender<Frame>,
    subscriber: WatchReceiver<Frame>,
}

pub struct SessionController<S, L: EventLoop> {
    shared: Rc<Shared<S, L>>,
}

impl<S, L: EventLoop> Clone for SessionController<S, L> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S, L> SessionController<S, L>
where
    S: SimulationService + 'static,
    L: EventLoop + 'static,
{
    pub fn new(service: S, event_loop: L, settings: &ClientSettings) -> Result<Self, ClientError> {
        let scheduler = PollingScheduler::new(settings.sim_speed, settings.failure_limit)?;
        let (frames, subscriber) = watch::channel(Frame::default());
        Ok(Self {
            shared: Rc::new(Shared {
                service,
                event_loop,
                core: RefCell::new(Core {
                    store: SessionStore::default(),
                    scheduler,
                    setup_epoch: 0,
                }),
                frames,
                subscriber,
            }),
        })
    }

    /// A receiver that sees every frame published from now on.
    pub fn frames(&self) -> WatchReceiver<Frame> {
        self.shared.subscriber.clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.core.borrow().store.state()
    }

    pub fn snapshot(&self) -> Option<GridSnapshot> {
        self.shared.core.borrow().store.snapshot().cloned()
    }

    pub fn metrics(&self) -> MetricsSeries {
        self.shared.core.borrow().store.metrics().clone()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.shared.core.borrow().store.stop_reason()
    }

    pub fn pending_config(&self) -> SimulationConfiguration {
        self.shared.core.borrow().store.pending_config().clone()
    }

    pub fn sim_speed(&self) -> f64 {
        self.shared.core.borrow().scheduler.sim_speed()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.shared.core.borrow().scheduler.fetch_in_flight()
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.shared.core.borrow().scheduler.skipped_ticks()
    }

    /// Replace the configuration used by the next [`setup`](Self::setup).
    pub fn configure(
        &self,
        config: SimulationConfiguration,
    ) -> Result<SimulationConfiguration, ClientError> {
        self.shared.core.borrow_mut().store.configure(config)
    }

    /// Edit one field of the pending configuration.
    pub fn update_config(
        &self,
        edit: impl FnOnce(&mut SimulationConfiguration),
    ) -> Result<SimulationConfiguration, ClientError> {
        let mut config = self.pending_config();
        edit(&mut config);
        self.configure(config)
    }

    /// Drop the current session, if any, and create a new one from the
    /// pending configuration.
    pub async fn setup(&self) -> Result<(), ClientError> {
        let (config, epoch) = {
            let mut core = self.shared.core.borrow_mut();
            let config = core.store.pending_config().clone();
            config.validate()?;
            core.scheduler.reset();
            core.store.reset();
            core.setup_epoch += 1;
            (config, core.setup_epoch)
        };
        self.shared.publish();

        log::info!(
            "creating {}x{} session",
            config.grid_width,
            config.grid_height
        );
        let created = self.shared.service.create_session(&config).await;

        {
            let mut core = self.shared.core.borrow_mut();
            if core.setup_epoch != epoch {
                log::debug!("setup superseded while waiting for the service");
                return Ok(());
            }
            let created = created.inspect_err(|e| log::warn!("setup failed: {e}"))?;
            core.store
                .install_session(created.handle, config, created.snapshot);
        }
        self.shared.publish();
        Ok(())
    }

    /// Begin polling the active session.
    pub fn start(&self) -> Result<(), ClientError> {
        let interval = {
            let mut core = self.shared.core.borrow_mut();
            let Core {
                store, scheduler, ..
            } = &mut *core;
            scheduler.start(store)?
        };
        Shared::arm(&self.shared, interval);
        self.shared.publish();
        Ok(())
    }

    /// Stop polling. Returns `None`, doing nothing, if no run was active.
    pub fn stop(&self) -> Option<StopReason> {
        let stopped = {
            let mut core = self.shared.core.borrow_mut();
            let Core {
                store, scheduler, ..
            } = &mut *core;
            scheduler.stop(store, StopReason::User)
        };
        if stopped.is_some() {
            self.shared.publish();
        }
        stopped
    }

    /// Change the polling rate; a running session is rescheduled.
    pub fn set_speed(&self, sim_speed: f64) -> Result<(), ClientError> {
        let reschedule = {
            let mut core = self.shared.core.borrow_mut();
            let state = core.store.state();
            core.scheduler.set_speed(sim_speed, state)?
        };
        if let Some(interval) = reschedule {
            Shared::arm(&self.shared, interval);
        }
        Ok(())
    }
}

impl<S, L> Shared<S, L>
where
    S: SimulationService + 'static,
    L: EventLoop + 'static,
{
    fn arm(this: &Rc<Self>, interval: Duration) {
        let weak = Rc::downgrade(this);
        let repeat = this.event_loop.repeat_every(
            interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Shared::tick(&shared);
                }
            }),
        );
        this.core.borrow_mut().scheduler.arm(repeat);
    }

    fn tick(this: &Rc<Self>) {
        let ticket = {
            let mut core = this.core.borrow_mut();
            let Core {
                store, scheduler, ..
            } = &mut *core;
            scheduler.begin_tick(store)
        };
        let Some(ticket) = ticket else {
            return;
        };
        let shared = Rc::clone(this);
        this.event_loop.spawn_local(Box::pin(async move {
            let result = shared.service.fetch_snapshot(ticket.handle()).await;
            shared.finish_tick(ticket, result);
        }));
    }

    fn finish_tick(&self, ticket: TickTicket, result: Result<GridSnapshot, ClientError>) {
        let outcome = {
            let mut core = self.core.borrow_mut();
            let Core {
                store, scheduler, ..
            } = &mut *core;
            scheduler.complete_tick(store, ticket, result)
        };
        match outcome {
            TickOutcome::Discarded | TickOutcome::Failed { .. } => {}
            outcome => {
                if outcome.stopped_run() {
                    log::debug!("run ended by the scheduler: {outcome:?}");
                }
                self.publish();
            }
        }
    }

    fn publish(&self) {
        let frame = Frame::capture(&self.core.borrow().store);
        self.frames.send(frame);
    }
}
