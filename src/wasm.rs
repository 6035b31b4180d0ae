//! Browser bindings
//!
//! A page drives the simulation through `Runner`: forward key events,
//! call `update` from `requestAnimationFrame`, then read the frame and
//! drained events back as JSON for the renderer.

use wasm_bindgen::prelude::*;

use crate::consts::SIM_DT;
use crate::drive_fixed_steps;
use crate::input::Intent;
use crate::settings::Settings;
use crate::sim::{SimulationState, TickInput, tick};
use crate::view::FrameView;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init only fails because a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Tunnel Runner core loaded");
}

#[wasm_bindgen]
pub struct Runner {
    state: SimulationState,
    accumulator: f32,
    /// Intents waiting for the next simulation step
    pending: TickInput,
}

#[wasm_bindgen]
impl Runner {
    /// Build a runner. Without a seed one is drawn from the browser's RNG.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Runner {
        let seed = seed.unwrap_or_else(rand::random);
        log::info!("New runner, seed {}", seed);
        Runner {
            state: SimulationState::new(seed, Settings::default()),
            accumulator: 0.0,
            pending: TickInput::none(),
        }
    }

    /// Build a runner with tuning given as JSON. Unknown fields are ignored
    /// and missing ones take their defaults.
    pub fn with_settings(seed: u64, settings_json: &str) -> Result<Runner, JsValue> {
        let settings =
            Settings::from_json(settings_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Runner {
            state: SimulationState::new(seed, settings),
            accumulator: 0.0,
            pending: TickInput::none(),
        })
    }

    /// Forward a keydown (`pressed`) or keyup. Returns whether the key is bound.
    pub fn key(&mut self, key: &str, pressed: bool) -> bool {
        match Intent::from_key(key, pressed) {
            Some(intent) => {
                self.pending.push(intent);
                true
            }
            None => false,
        }
    }

    /// Advance by wall-clock seconds. Returns the number of ticks run.
    pub fn update(&mut self, dt_seconds: f32) -> u32 {
        let Self {
            state,
            accumulator,
            pending,
        } = self;
        drive_fixed_steps(accumulator, dt_seconds, |dt| {
            let input = std::mem::take(pending);
            tick(state, &input, dt);
        })
    }

    pub fn frame_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&FrameView::capture(&self.state))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.drain_events())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn score(&self) -> u64 {
        self.state.score()
    }

    pub fn high_score(&self) -> u64 {
        self.state.high_score()
    }

    pub fn seed(&self) -> u64 {
        self.state.seed
    }

    /// Fixed step length in seconds
    pub fn tick_seconds() -> f32 {
        SIM_DT
    }
}
