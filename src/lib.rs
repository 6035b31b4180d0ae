//! Tunnel Runner - simulation core of an endless 3D runner
//!
//! Modules:
//! - `sim`: Deterministic simulation (track recycling, entities, physics, collisions, run state)
//! - `input`: Discrete player intents and keyboard mapping
//! - `view`: What the presentation layer receives each frame
//! - `settings`: Data-driven tuning
//! - `highscores`: In-process high score

pub mod highscores;
pub mod input;
pub mod settings;
pub mod sim;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use highscores::HighScore;
pub use input::Intent;
pub use settings::{Settings, SettingsError};
pub use view::{FrameSink, FrameView};

/// Engine constants that are not part of game balance
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Most ticks one rendered frame may run; slower frames drop time
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Shortest interval a score or spawn timer may run at
    pub const MIN_CADENCE: f32 = SIM_DT / 16.0;
}

/// Run a fixed-timestep accumulator forward by `frame_dt` seconds.
///
/// Calls `step` once per whole `SIM_DT` in the accumulator, at most
/// `MAX_SUBSTEPS` times, and returns how many steps ran. Time left over
/// after the cap is dropped, keeping only the partial step.
pub fn drive_fixed_steps(accumulator: &mut f32, frame_dt: f32, mut step: impl FnMut(f32)) -> u32 {
    use consts::*;

    if frame_dt.is_finite() {
        *accumulator += frame_dt.max(0.0);
    }
    let mut substeps = 0;
    while *accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        step(SIM_DT);
        *accumulator -= SIM_DT;
        substeps += 1;
    }
    if *accumulator >= SIM_DT {
        *accumulator %= SIM_DT;
    }
    substeps
}
