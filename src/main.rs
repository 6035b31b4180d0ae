//! Tunnel Runner headless entry point
//!
//! Plays a scripted session on the fixed timestep, logs every game event
//! and prints the final frame as JSON.
//!
//! Usage: `tunnel-runner [seed] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use tunnel_runner::consts::SIM_DT;
    use tunnel_runner::drive_fixed_steps;
    use tunnel_runner::input::Intent;
    use tunnel_runner::settings::Settings;
    use tunnel_runner::sim::{GameEvent, SimulationState, TickInput, tick};
    use tunnel_runner::view::{FrameSink, FrameView, publish};

    const DEFAULT_SEED: u64 = 42;
    /// Frame length of the simulated display, deliberately off the tick rate
    const FRAME_DT: f32 = 1.0 / 50.0;
    const SESSION_FRAMES: u32 = 2_400;

    /// Intents fired at given frames
    const SCRIPT: &[(u32, Intent)] = &[
        (5, Intent::Restart),
        (60, Intent::MoveLeftStart),
        (90, Intent::MoveLeftStop),
        (150, Intent::Jump),
        (220, Intent::CrouchStart),
        (260, Intent::CrouchStop),
        (300, Intent::MoveRightStart),
        (360, Intent::MoveRightStop),
        (400, Intent::PauseToggle),
        (450, Intent::PauseToggle),
        (700, Intent::Jump),
        (1_200, Intent::Restart),
        (1_300, Intent::MoveRightStart),
        (1_340, Intent::MoveRightStop),
        (1_500, Intent::Jump),
    ];

    /// Sink that reports through the logger
    #[derive(Default)]
    struct LogSink {
        frames: u32,
        last: Option<FrameView>,
    }

    impl FrameSink for LogSink {
        fn frame(&mut self, view: &FrameView) {
            self.frames += 1;
            if self.frames % 300 == 0 {
                log::info!(
                    "frame {}: {:?} z {:.1} score {} speed {:.3}",
                    self.frames,
                    view.phase,
                    view.player.transform.position.z,
                    view.score,
                    view.speed
                );
            }
            self.last = Some(view.clone());
        }

        fn event(&mut self, event: &GameEvent) {
            match event {
                GameEvent::ScoreChanged(_) => log::debug!("{event:?}"),
                _ => log::info!("{event:?}"),
            }
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(arg) => arg.parse().unwrap_or_else(|_| {
                log::warn!("Seed {arg:?} is not a number, using {DEFAULT_SEED}");
                DEFAULT_SEED
            }),
            None => DEFAULT_SEED,
        };
        let settings = args.next().map(Settings::load).unwrap_or_default();

        log::info!("Tunnel Runner (headless) starting, seed {seed}");
        let mut state = SimulationState::new(seed, settings);
        let mut sink = LogSink::default();
        let mut accumulator = 0.0;
        let mut pending = TickInput::none();
        let mut ticks = 0;

        for frame in 0..SESSION_FRAMES {
            SCRIPT
                .iter()
                .filter(|(at, _)| *at == frame)
                .for_each(|(_, intent)| pending.push(*intent));

            ticks += drive_fixed_steps(&mut accumulator, FRAME_DT, |dt| {
                let input = std::mem::take(&mut pending);
                tick(&mut state, &input, dt);
            });
            publish(&mut state, &mut sink);
        }

        log::info!(
            "Session over: {} ticks ({:.1}s simulated), score {}, best {}",
            ticks,
            ticks as f32 * SIM_DT,
            state.score(),
            state.high_score()
        );

        let last = sink.last.unwrap_or_else(|| FrameView::capture(&state));
        match serde_json::to_string_pretty(&last) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Could not serialize final frame: {err}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser builds are driven through `tunnel_runner::wasm::Runner`
}
