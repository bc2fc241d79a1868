#![allow(dead_code)]

use std::{
    cell::{Cell as Flag, RefCell},
    collections::VecDeque,
    rc::Rc,
    time::Duration,
};

use firesim_client::{
    ClientError,
    event_loop::{EventLoop, LocalTask},
    remote::{CreatedSession, SimulationService},
    session::{Cell, CellStatus, GridSnapshot, SessionHandle, SimulationConfiguration},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Event loop

struct Ticker {
    period: Duration,
    live: Rc<Flag<bool>>,
    tick: Box<dyn FnMut()>,
}

#[derive(Default)]
struct LoopState {
    tickers: RefCell<Vec<Ticker>>,
    tasks: RefCell<VecDeque<LocalTask>>,
}

/// Event loop whose timers only fire when the test says so.
#[derive(Clone, Default)]
pub struct ManualLoop(Rc<LoopState>);

pub struct ManualRepeat(Rc<Flag<bool>>);

impl Drop for ManualRepeat {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventLoop for ManualLoop {
    type Repeat = ManualRepeat;

    fn repeat_every(&self, period: Duration, tick: Box<dyn FnMut()>) -> ManualRepeat {
        let live = Rc::new(Flag::new(true));
        self.0.tickers.borrow_mut().push(Ticker {
            period,
            live: Rc::clone(&live),
            tick,
        });
        ManualRepeat(live)
    }

    fn spawn_local(&self, task: LocalTask) {
        self.0.tasks.borrow_mut().push_back(task);
    }
}

impl ManualLoop {
    /// Let one period elapse on every live timer.
    pub fn fire(&self) {
        let mut tickers = std::mem::take(&mut *self.0.tickers.borrow_mut());
        tickers.retain(|t| t.live.get());
        for ticker in tickers.iter_mut() {
            if ticker.live.get() {
                (ticker.tick)();
            }
        }
        let mut slot = self.0.tickers.borrow_mut();
        tickers.append(&mut slot);
        *slot = tickers;
    }

    /// Drive every spawned task to completion. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.0.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                return ran;
            };
            pollster::block_on(task);
            ran += 1;
        }
    }

    pub fn step(&self) {
        self.fire();
        self.run_pending();
    }

    pub fn pending_tasks(&self) -> usize {
        self.0.tasks.borrow().len()
    }

    pub fn live_timers(&self) -> usize {
        self.0
            .tickers
            .borrow()
            .iter()
            .filter(|t| t.live.get())
            .count()
    }

    pub fn live_period(&self) -> Option<Duration> {
        self.0
            .tickers
            .borrow()
            .iter()
            .rev()
            .find(|t| t.live.get())
            .map(|t| t.period)
    }
}

// Simulation service

/// Minimal forest-fire engine: the centre tree starts burning, burning trees
/// burn out after one step and ignite each green orthogonal neighbour with
/// the configured probability.
struct Forest {
    width: u32,
    height: u32,
    probability: u8,
    cells: Vec<Cell>,
    rng: fastrand::Rng,
}

impl Forest {
    fn new(config: &SimulationConfiguration, seed: u64) -> Self {
        let (width, height) = (config.grid_width, config.grid_height);
        let centre = ((width + 1) / 2, (height + 1) / 2);
        let cells = (1..=height)
            .flat_map(|row| (1..=width).map(move |col| (col, row)))
            .enumerate()
            .map(|(i, pos)| Cell {
                id: i as u64 + 1,
                pos,
                status: if pos == centre {
                    CellStatus::Burning
                } else {
                    CellStatus::Green
                },
            })
            .collect();
        Self {
            width,
            height,
            probability: config.spread_probability,
            cells,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn index(&self, col: u32, row: u32) -> usize {
        ((row - 1) * self.width + (col - 1)) as usize
    }

    fn step(&mut self) {
        let burning: Vec<(u32, u32)> = self
            .cells
            .iter()
            .filter(|c| c.status == CellStatus::Burning)
            .map(|c| c.pos)
            .collect();
        for &(col, row) in &burning {
            let i = self.index(col, row);
            self.cells[i].status = CellStatus::Burnt;
        }
        for (col, row) in burning {
            let neighbours = [
                (col.wrapping_sub(1), row),
                (col + 1, row),
                (col, row.wrapping_sub(1)),
                (col, row + 1),
            ];
            for (c, r) in neighbours {
                if c == 0 || r == 0 || c > self.width || r > self.height {
                    continue;
                }
                let i = self.index(c, r);
                if self.cells[i].status == CellStatus::Green
                    && self.rng.u8(0..100) < self.probability
                {
                    self.cells[i].status = CellStatus::Burning;
                }
            }
        }
    }

    fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::new(self.cells.clone())
    }
}

#[derive(Default)]
struct ServiceState {
    forest: Option<Forest>,
    session: u64,
    creates: u32,
    fetches: u32,
    fail_next: u32,
    reject_next_create: bool,
}

/// In-memory [`SimulationService`] with fault injection.
#[derive(Clone, Default)]
pub struct ScriptedService(Rc<RefCell<ServiceState>>);

impl ScriptedService {
    pub fn creates(&self) -> u32 {
        self.0.borrow().creates
    }

    pub fn fetches(&self) -> u32 {
        self.0.borrow().fetches
    }

    /// Make the next `n` fetches fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.0.borrow_mut().fail_next = n;
    }

    pub fn reject_next_create(&self) {
        self.0.borrow_mut().reject_next_create = true;
    }

    /// Expire every session the service handed out.
    pub fn forget_sessions(&self) {
        let mut state = self.0.borrow_mut();
        state.forest = None;
    }
}

impl SimulationService for ScriptedService {
    async fn create_session(
        &self,
        config: &SimulationConfiguration,
    ) -> Result<CreatedSession, ClientError> {
        let mut state = self.0.borrow_mut();
        state.creates += 1;
        if std::mem::take(&mut state.reject_next_create) {
            return Err(ClientError::InvalidConfiguration(
                "service rejected parameters".into(),
            ));
        }
        state.session += 1;
        let forest = Forest::new(config, state.session);
        let snapshot = forest.snapshot();
        state.forest = Some(forest);
        Ok(CreatedSession {
            handle: SessionHandle::new(format!("/simulations/{}", state.session)),
            snapshot,
        })
    }

    async fn fetch_snapshot(&self, handle: &SessionHandle) -> Result<GridSnapshot, ClientError> {
        let mut state = self.0.borrow_mut();
        state.fetches += 1;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ClientError::ServiceUnavailable("connection reset".into()));
        }
        let current = format!("/simulations/{}", state.session);
        if handle.as_str() != current {
            return Err(ClientError::SessionNotFound(handle.clone()));
        }
        let Some(forest) = state.forest.as_mut() else {
            return Err(ClientError::SessionNotFound(handle.clone()));
        };
        forest.step();
        Ok(forest.snapshot())
    }
}
