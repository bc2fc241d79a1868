use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::{
    config::ClientSettings,
    controller::{Frame, SessionController},
    event_loop::BrowserEventLoop,
    remote::HttpSimulationService,
    rendering::{CanvasLayout, canvas::CanvasSurface},
    session::LifecycleState,
};

pub mod config;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod remote;
pub mod rendering;
pub mod scheduler;
pub mod session;
pub mod termination;
pub mod util;

pub use controller::SessionController;
pub use error::ClientError;

#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::Output::call(console_log::log))
        .apply();
}

#[cfg(target_arch = "wasm32")]
fn to_js(e: ClientError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser front end: forwards UI commands to the session controller and
/// paints the frames it publishes.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct FireSimApp {
    controller: SessionController<HttpSimulationService, BrowserEventLoop>,
    frames: watch::WatchReceiver<Frame>,
    surface: CanvasSurface,
    layout: CanvasLayout,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl FireSimApp {
    /// Bind to the grid and chart canvases. `base_url` defaults to the
    /// local development server.
    #[wasm_bindgen(constructor)]
    pub fn new(
        grid_canvas_id: &str,
        chart_canvas_id: &str,
        base_url: Option<String>,
    ) -> Result<FireSimApp, JsValue> {
        let settings = match base_url {
            Some(url) => ClientSettings::default().with_base_url(url),
            None => ClientSettings::default(),
        };
        let surface = CanvasSurface::new(grid_canvas_id, chart_canvas_id)
            .map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
        let service = HttpSimulationService::new(&settings).map_err(to_js)?;
        let controller =
            SessionController::new(service, BrowserEventLoop, &settings).map_err(to_js)?;
        log::info!("client ready, service at {}", settings.base_url);
        Ok(Self {
            frames: controller.frames(),
            controller,
            surface,
            layout: settings.layout,
        })
    }

    /// Create a new session from the current parameters.
    #[wasm_bindgen]
    pub fn setup(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            controller
                .setup()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(to_js)
        })
    }

    #[wasm_bindgen]
    pub fn start(&self) -> Result<(), JsValue> {
        self.controller.start().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn stop(&self) {
        self.controller.stop();
    }

    /// Set polling rate in ticks per second
    #[wasm_bindgen]
    pub fn set_sim_speed(&self, value: f64) -> Result<(), JsValue> {
        self.controller.set_speed(value).map_err(to_js)
    }

    /// Set grid side length; applies from the next setup
    #[wasm_bindgen]
    pub fn set_grid_size(&self, value: u32) -> Result<(), JsValue> {
        self.update_param(|p| {
            p.grid_width = value;
            p.grid_height = value;
        })
    }

    /// Set spread probability (0-100)
    #[wasm_bindgen]
    pub fn set_probability(&self, value: u8) -> Result<(), JsValue> {
        self.update_param(|p| p.spread_probability = value)
    }

    #[wasm_bindgen]
    pub fn set_south_wind(&self, value: i32) -> Result<(), JsValue> {
        self.update_param(|p| p.south_wind = value)
    }

    #[wasm_bindgen]
    pub fn set_west_wind(&self, value: i32) -> Result<(), JsValue> {
        self.update_param(|p| p.west_wind = value)
    }

    #[wasm_bindgen]
    pub fn set_big_jumps(&self, value: bool) -> Result<(), JsValue> {
        self.update_param(|p| p.big_jumps = value)
    }

    /// Draw the latest frame if it changed. Returns whether polling is
    /// still running, so the caller knows to keep its animation loop going.
    #[wasm_bindgen]
    pub fn render(&mut self) -> Result<bool, JsValue> {
        if let Some(frame) = self.frames.get_if_new() {
            rendering::present(&mut self.surface, &frame, &self.layout)?;
        }
        Ok(self.controller.state() == LifecycleState::Running)
    }

    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.controller.state().to_string()
    }

    /// Why the last run stopped, if it has
    #[wasm_bindgen]
    pub fn stop_reason(&self) -> Option<String> {
        self.controller.stop_reason().map(|r| r.to_string())
    }

    /// True when the last run ended because of a service problem rather
    /// than the user or a burnt-out grid
    #[wasm_bindgen]
    pub fn stopped_on_failure(&self) -> bool {
        self.controller
            .stop_reason()
            .is_some_and(|r| r.is_failure())
    }

    fn update_param<F: FnOnce(&mut session::SimulationConfiguration)>(
        &self,
        f: F,
    ) -> Result<(), JsValue> {
        self.controller.update_config(f).map(|_| ()).map_err(to_js)
    }
}
