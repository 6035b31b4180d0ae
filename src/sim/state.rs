//! Run state and the simulation state container
//!
//! Everything a run needs lives in one `SimulationState` value. Components
//! receive the pieces they touch by `&mut`; there is no global state.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{EffectKind, EffectManager};
use super::entities::EntityRegistry;
use super::player::{Controls, Player};
use super::track::{SpatialRecycler, Track};
use crate::consts::MIN_CADENCE;
use crate::highscores::HighScore;
use crate::settings::Settings;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Before the first run, nothing moves
    Idle,
    Running,
    /// Frozen until toggled back
    Paused,
    /// Run ended by an obstacle
    GameOver,
}

/// Discrete notifications for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(u64),
    HighScoreChanged(u64),
    GameOver { final_score: u64, high_score: u64 },
    PowerUpActivated { kind: EffectKind, duration_secs: f32 },
    PowerUpExpired { kind: EffectKind },
    PhaseChanged { from: RunPhase, to: RunPhase },
}

/// Phase, score and world speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub phase: RunPhase,
    pub score: u64,
    pub high_score: HighScore,
    /// Speed a run starts with and effects revert to
    pub base_speed: f32,
    /// Current forward distance per tick
    pub speed: f32,
    pub lateral_speed: f32,
}

impl RunState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            phase: RunPhase::Idle,
            score: 0,
            high_score: HighScore::new(),
            base_speed: settings.speed,
            speed: settings.speed,
            lateral_speed: settings.lateral_speed,
        }
    }
}

/// Fixed-interval timer fed with elapsed time. Partial progress toward the
/// next firing is kept between calls. Intervals below `MIN_CADENCE` are
/// raised to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub interval: f32,
    pub elapsed: f32,
}

impl Cadence {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(MIN_CADENCE),
            elapsed: 0.0,
        }
    }

    /// Add `dt` seconds and return how many intervals completed
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.interval.is_nan() || self.interval < MIN_CADENCE || !dt.is_finite() {
            return 0;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.interval {
            return 0;
        }
        let fired = (self.elapsed / self.interval).floor();
        self.elapsed = (self.elapsed - fired * self.interval).clamp(0.0, self.interval);
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
        }
        fired as u32
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// The whole simulation
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub seed: u64,
    pub settings: Settings,
    pub run: RunState,
    pub controls: Controls,
    pub player: Player,
    pub track: Track,
    pub recycler: SpatialRecycler,
    pub registry: EntityRegistry,
    pub effects: EffectManager,
    /// Awards one point per interval while running
    pub score_clock: Cadence,
    /// Runs a power-up spawn trial per interval while running
    pub spawn_timer: Cadence,
    /// Running ticks since the current run started
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
}

impl SimulationState {
    /// Build the world for `seed`, idle until the first restart intent
    pub fn new(seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let player = Player::new(&settings);
        let registry = EntityRegistry::populate(&settings, player.position.z, &mut rng);

        Self {
            seed,
            run: RunState::new(&settings),
            controls: Controls::default(),
            track: Track::new(&settings),
            recycler: SpatialRecycler::new(&settings),
            effects: EffectManager::new(),
            score_clock: Cadence::new(settings.score_interval),
            spawn_timer: Cadence::new(settings.powerup_spawn_interval),
            time_ticks: 0,
            player,
            registry,
            rng,
            events: Vec::new(),
            settings,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.run.phase
    }

    pub fn score(&self) -> u64 {
        self.run.score
    }

    pub fn high_score(&self) -> u64 {
        self.run.high_score.best()
    }

    /// Events raised since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, to: RunPhase) {
        let from = self.run.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.run.phase = to;
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    pub(crate) fn add_score(&mut self, points: u32) {
        if points == 0 {
            return;
        }
        self.run.score = self.run.score.saturating_add(points as u64);
        self.events.push(GameEvent::ScoreChanged(self.run.score));
    }

    /// Fold the current score into the high score. A run still in
    /// progress counts as finished here; one that already ended in
    /// game over was counted then.
    fn record_high_score(&mut self) {
        let score = self.run.score;
        let improved = match self.run.phase {
            RunPhase::Running | RunPhase::Paused => self.run.high_score.submit(score),
            RunPhase::Idle | RunPhase::GameOver => self.run.high_score.observe(score),
        };
        if improved {
            self.events
                .push(GameEvent::HighScoreChanged(self.run.high_score.best()));
        }
    }

    /// End the run: the world stops, effects are reverted, the high score
    /// is updated. Calling it again changes nothing.
    pub fn end_run(&mut self) {
        if self.run.phase == RunPhase::GameOver {
            return;
        }
        self.effects
            .cancel_all(&mut self.run, &mut self.player, &mut self.events);
        self.run.speed = 0.0;
        if self.run.high_score.submit(self.run.score) {
            self.events
                .push(GameEvent::HighScoreChanged(self.run.high_score.best()));
        }
        self.events.push(GameEvent::GameOver {
            final_score: self.run.score,
            high_score: self.run.high_score.best(),
        });
        log::info!(
            "Game over after {} ticks: score {}, best {}",
            self.time_ticks,
            self.run.score,
            self.run.high_score.best()
        );
        self.set_phase(RunPhase::GameOver);
    }

    /// Start a fresh run from any phase. Pools, track, player, effects,
    /// speeds and timers are rebuilt; only the high score survives.
    pub fn restart(&mut self) {
        self.effects
            .cancel_all(&mut self.run, &mut self.player, &mut self.events);
        self.record_high_score();

        let settings = &self.settings;
        self.player = Player::new(settings);
        self.track = Track::new(settings);
        self.recycler = SpatialRecycler::new(settings);
        self.registry = EntityRegistry::populate(settings, self.player.position.z, &mut self.rng);
        self.effects = EffectManager::new();
        self.score_clock = Cadence::new(settings.score_interval);
        self.spawn_timer = Cadence::new(settings.powerup_spawn_interval);
        self.controls.jump = false;
        self.time_ticks = 0;

        self.run.base_speed = settings.speed;
        self.run.speed = settings.speed;
        self.run.lateral_speed = settings.lateral_speed;
        if self.run.score != 0 {
            self.run.score = 0;
            self.events.push(GameEvent::ScoreChanged(0));
        }

        log::info!("Run started (high score {})", self.run.high_score.best());
        self.set_phase(RunPhase::Running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::DangerClass;

    #[test]
    fn test_new_state_is_idle_with_world() {
        let state = SimulationState::new(42, Settings::default());
        assert_eq!(state.phase(), RunPhase::Idle);
        assert_eq!(state.score(), 0);
        assert!(state.registry.active_count() > 0);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_cadence_keeps_partial_progress() {
        let mut cadence = Cadence::new(0.1);
        assert_eq!(cadence.advance(0.06), 0);
        assert_eq!(cadence.advance(0.06), 1);
        assert!((cadence.elapsed - 0.02).abs() < 1e-5);
        assert_eq!(cadence.advance(0.35), 3);
    }

    #[test]
    fn test_cadence_tiny_interval_terminates() {
        let mut cadence = Cadence::new(1e-12);
        assert_eq!(cadence.interval, MIN_CADENCE);
        let fired = cadence.advance(crate::consts::SIM_DT);
        assert!((15..=16).contains(&fired));
        assert!(cadence.elapsed < cadence.interval);

        // A hand-built timer below the floor never fires
        let mut raw = Cadence {
            interval: 1e-12,
            elapsed: 0.0,
        };
        assert_eq!(raw.advance(1.0), 0);
    }

    #[test]
    fn test_restart_after_game_over() {
        let settings = Settings::default();
        let mut state = SimulationState::new(1, settings.clone());
        state.restart();
        state.run.score = 137;
        state.registry.remove(1);
        state.end_run();
        assert_eq!(state.phase(), RunPhase::GameOver);
        assert_eq!(state.high_score(), 137);
        assert_eq!(state.run.speed, 0.0);

        state.restart();
        assert_eq!(state.phase(), RunPhase::Running);
        assert_eq!(state.score(), 0);
        assert_eq!(state.high_score(), 137);
        assert_eq!(state.run.speed, settings.speed);
        assert_eq!(
            state.registry.active_count_of(DangerClass::Obstacle),
            (settings.ground_obstacles + settings.sky_obstacles) as usize
        );
        assert_eq!(
            state.registry.active_count_of(DangerClass::Pickup),
            settings.initial_powerups as usize
        );
    }

    #[test]
    fn test_restart_records_unsubmitted_score() {
        let mut state = SimulationState::new(2, Settings::default());
        state.restart();
        state.run.score = 137;
        state.run.phase = RunPhase::GameOver;
        state.restart();
        assert_eq!(state.high_score(), 137);
        assert!(state.events().contains(&GameEvent::HighScoreChanged(137)));
    }

    #[test]
    fn test_every_finished_run_counted_once() {
        let mut state = SimulationState::new(5, Settings::default());
        state.restart();
        assert_eq!(state.run.high_score.runs(), 0);

        state.run.score = 40;
        state.end_run();
        state.restart();
        assert_eq!(state.run.high_score.runs(), 1);

        // Abandoned mid-run without a record
        state.run.score = 3;
        state.restart();
        assert_eq!(state.run.high_score.runs(), 2);
        assert_eq!(state.high_score(), 40);

        state.run.score = 7;
        state.run.phase = RunPhase::Paused;
        state.restart();
        assert_eq!(state.run.high_score.runs(), 3);
    }

    #[test]
    fn test_end_run_is_idempotent() {
        let mut state = SimulationState::new(3, Settings::default());
        state.restart();
        state.run.score = 5;
        state.end_run();
        let events = state.drain_events();
        state.end_run();
        assert!(state.events().is_empty());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_restart_cancels_effects_before_rebuild() {
        let settings = Settings::default();
        let mut state = SimulationState::new(4, settings.clone());
        state.restart();
        let SimulationState {
            effects,
            run,
            player,
            events,
            settings: s,
            ..
        } = &mut state;
        effects.apply(EffectKind::JumpBoost, run, player, s, events);
        effects.apply(EffectKind::SpeedDebuff, run, player, s, events);

        state.restart();
        assert_eq!(state.effects.active().count(), 0);
        assert_eq!(state.player.jump_strength, settings.jump_strength);
        assert_eq!(state.run.speed, settings.speed);
    }
}
