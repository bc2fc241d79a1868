//! The cooperative event loop the controller schedules its work on.

use std::{future::Future, pin::Pin, time::Duration};

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

pub trait EventLoop {
    /// Keeps the repetition alive; dropping it cancels all further ticks.
    type Repeat;

    fn repeat_every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Self::Repeat;

    fn spawn_local(&self, task: LocalTask);
}

/// Browser event loop backed by `setInterval` and the microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserEventLoop;

impl EventLoop for BrowserEventLoop {
    type Repeat = gloo_timers::callback::Interval;

    fn repeat_every(&self, period: Duration, mut tick: Box<dyn FnMut()>) -> Self::Repeat {
        let millis = period.as_millis().clamp(1, u32::MAX as u128) as u32;
        gloo_timers::callback::Interval::new(millis, move || tick())
    }

    fn spawn_local(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
