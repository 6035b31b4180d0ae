//! One step of a run
//!
//! Intents are applied first; everything after that only happens while the
//! run is in `RunPhase::Running`.

use serde::{Deserialize, Serialize};

use super::collision::{self, ContactKind};
use super::entities::SpawnWindow;
use super::state::{RunPhase, SimulationState};
use crate::input::Intent;

/// Everything the player did since the previous tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Intents in the order they arrived since the previous tick
    pub intents: Vec<Intent>,
}

impl TickInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(intent: Intent) -> Self {
        Self {
            intents: vec![intent],
        }
    }

    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

impl From<Vec<Intent>> for TickInput {
    fn from(intents: Vec<Intent>) -> Self {
        Self { intents }
    }
}

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimulationState, input: &TickInput, dt: f32) {
    for &intent in &input.intents {
        handle_intent(state, intent);
    }

    // Idle, paused and game-over ticks change nothing but the one-shot jump
    if state.run.phase != RunPhase::Running {
        state.controls.jump = false;
        return;
    }

    state.time_ticks += 1;
    advance_running(state, dt);
    state.controls.jump = false;
}

fn handle_intent(state: &mut SimulationState, intent: Intent) {
    if intent.latch(&mut state.controls) {
        return;
    }
    match intent {
        Intent::PauseToggle => match state.run.phase {
            RunPhase::Running => state.set_phase(RunPhase::Paused),
            RunPhase::Paused => state.set_phase(RunPhase::Running),
            RunPhase::Idle | RunPhase::GameOver => {}
        },
        Intent::Restart => state.restart(),
        _ => {}
    }
}

/// Controller, recycling, effects, collisions, scoring
fn advance_running(state: &mut SimulationState, dt: f32) {
    let crashed = {
        let SimulationState {
            settings,
            run,
            controls,
            player,
            track,
            recycler,
            registry,
            effects,
            spawn_timer,
            rng,
            events,
            ..
        } = state;

        let speed = run.speed;
        player.step(controls, speed, run.lateral_speed, settings);
        track.advance(speed);

        let player_z = player.position.z;
        let moved = track.recycle_segments(player_z)
            + recycler.recycle(registry.entities_mut(), player_z, settings, rng);
        if moved > 0 {
            log::debug!("Recycled {} behind z {:.1}", moved, player_z);
        }

        effects.advance(dt, run, player, events);
        for _ in 0..spawn_timer.advance(dt) {
            let window = SpawnWindow::ahead_of(player_z, settings);
            registry.spawn_power_up(settings.powerup_spawn_probability, window, settings, rng);
        }

        let contacts = collision::resolve(
            &player.volume(),
            registry.entities(),
            effects.shielded(),
            settings.pickup_radius,
        );

        match collision::first_obstacle(&contacts) {
            Some(contact) => {
                log::info!("Hit obstacle {} at z {:.1}", contact.entity, player_z);
                true
            }
            None => {
                for contact in &contacts {
                    let ContactKind::PowerUp(kind) = contact.kind else {
                        continue;
                    };
                    if registry.remove(contact.entity) {
                        effects.apply(kind, run, player, settings, events);
                    }
                }
                false
            }
        }
    };

    if crashed {
        state.end_run();
        return;
    }

    let points = state.score_clock.advance(dt);
    state.add_score(points);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::Settings;
    use crate::sim::effects::EffectKind;
    use crate::sim::entities::{DangerClass, EntityKind};
    use crate::sim::state::GameEvent;
    use crate::view::FrameView;
    use proptest::prelude::*;

    fn running(seed: u64, settings: Settings) -> SimulationState {
        let mut state = SimulationState::new(seed, settings);
        tick(&mut state, &TickInput::single(Intent::Restart), SIM_DT);
        state.drain_events();
        state
    }

    fn shield(state: &mut SimulationState) {
        let SimulationState {
            effects,
            run,
            player,
            settings,
            events,
            ..
        } = state;
        effects.apply(EffectKind::Shield, run, player, settings, events);
    }

    #[test]
    fn test_idle_until_restart() {
        let mut state = SimulationState::new(7, Settings::default());
        let before = FrameView::capture(&state);
        for _ in 0..30 {
            tick(&mut state, &TickInput::single(Intent::MoveLeftStart), SIM_DT);
        }
        assert_eq!(state.phase(), RunPhase::Idle);
        assert_eq!(FrameView::capture(&state), before);

        tick(&mut state, &TickInput::single(Intent::Restart), SIM_DT);
        assert_eq!(state.phase(), RunPhase::Running);
        assert!(state.events().contains(&GameEvent::PhaseChanged {
            from: RunPhase::Idle,
            to: RunPhase::Running
        }));
    }

    #[test]
    fn test_running_tick_moves_forward() {
        let settings = Settings::default();
        let mut state = running(1, settings.clone());
        let z = state.player.position.z;
        tick(&mut state, &TickInput::none(), SIM_DT);
        assert!((state.player.position.z - (z - settings.speed)).abs() < 1e-5);
        assert!((state.track.distance() - 2.0 * settings.speed).abs() < 1e-5);
    }

    #[test]
    fn test_steering_uses_run_lateral_speed() {
        let mut state = running(1, Settings::default());
        state.run.lateral_speed = 0.5;
        tick(&mut state, &TickInput::single(Intent::MoveRightStart), SIM_DT);
        assert!((state.player.position.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_pause_toggle_round_trip() {
        let mut state = running(2, Settings::default());
        tick(&mut state, &TickInput::single(Intent::PauseToggle), SIM_DT);
        assert_eq!(state.phase(), RunPhase::Paused);
        let z = state.player.position.z;
        tick(&mut state, &TickInput::none(), SIM_DT);
        assert_eq!(state.player.position.z, z);

        tick(&mut state, &TickInput::single(Intent::PauseToggle), SIM_DT);
        assert_eq!(state.phase(), RunPhase::Running);
        assert!(state.player.position.z < z);
    }

    #[test]
    fn test_jump_dropped_while_paused() {
        let mut state = running(3, Settings::default());
        tick(
            &mut state,
            &TickInput::from(vec![Intent::PauseToggle, Intent::Jump]),
            SIM_DT,
        );
        tick(&mut state, &TickInput::single(Intent::PauseToggle), SIM_DT);
        assert!(!state.player.airborne);
    }

    #[test]
    fn test_score_accrues_on_cadence() {
        let mut state = running(4, Settings::default());
        for _ in 0..59 {
            tick(&mut state, &TickInput::none(), SIM_DT);
        }
        // One second of running at 0.1s per point
        assert!((9..=10).contains(&state.score()));
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ScoreChanged(_)))
        );
    }

    #[test]
    fn test_obstacle_contact_ends_run() {
        let settings = Settings::default();
        let mut state = running(5, settings.clone());
        state.run.score = 12;
        let at = state.player.position;
        state.registry.insert(EntityKind::GroundObstacle, at, &settings);

        tick(&mut state, &TickInput::none(), SIM_DT);
        assert_eq!(state.phase(), RunPhase::GameOver);
        assert_eq!(state.run.speed, 0.0);
        assert_eq!(state.high_score(), 12);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GameOver {
            final_score: 12,
            high_score: 12
        }));

        let z = state.player.position.z;
        tick(&mut state, &TickInput::single(Intent::MoveLeftStart), SIM_DT);
        assert_eq!(state.player.position.z, z);
    }

    #[test]
    fn test_shield_prevents_game_over() {
        let settings = Settings::default();
        let mut state = running(6, settings.clone());
        shield(&mut state);
        let at = state.player.position;
        let id = state.registry.insert(EntityKind::GroundObstacle, at, &settings);

        tick(&mut state, &TickInput::single(Intent::MoveRightStart), SIM_DT);
        assert_eq!(state.phase(), RunPhase::Running);
        assert!(state.registry.get(id).is_some_and(|e| e.active));
        assert_eq!(state.player.position.x, 0.0);
    }

    #[test]
    fn test_pickup_collected_and_applied() {
        let settings = Settings::default();
        let mut state = running(7, settings.clone());
        let at = state.player.position;
        let id = state
            .registry
            .insert(EntityKind::PowerUp(EffectKind::JumpBoost), at, &settings);

        tick(&mut state, &TickInput::none(), SIM_DT);
        assert!(!state.registry.get(id).is_some_and(|e| e.active));
        assert!(state.effects.is_active(EffectKind::JumpBoost));
        assert!(
            (state.player.jump_strength - settings.jump_strength - settings.jump_boost_increment)
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_restart_from_game_over_keeps_high_score() {
        let settings = Settings::default();
        let mut state = running(8, settings.clone());
        state.run.score = 137;
        let at = state.player.position;
        state.registry.insert(EntityKind::GroundObstacle, at, &settings);
        tick(&mut state, &TickInput::none(), SIM_DT);
        assert_eq!(state.phase(), RunPhase::GameOver);

        tick(&mut state, &TickInput::single(Intent::Restart), SIM_DT);
        assert_eq!(state.phase(), RunPhase::Running);
        assert_eq!(state.high_score(), 137);
        assert!(state.score() <= 1);
        assert_eq!(state.run.speed, settings.speed);
        assert!(state.player.position.z > -1.0);
    }

    #[test]
    fn test_pools_survive_many_laps() {
        let settings = Settings {
            shield_duration: 1.0e6,
            speed_debuff_factor: 1.0,
            ..Default::default()
        };
        let mut state = running(9, settings.clone());
        shield(&mut state);
        let capacity = state.registry.capacity();
        let obstacles = state.registry.active_count_of(DangerClass::Obstacle);
        let lap = settings.track_length();

        for _ in 0..6_000 {
            tick(&mut state, &TickInput::none(), SIM_DT);
            assert_eq!(state.registry.capacity(), capacity);
            assert_eq!(state.registry.active_count_of(DangerClass::Obstacle), obstacles);

            let threshold = state.player.position.z + settings.trailing_margin;
            for entity in state.registry.active() {
                assert!(entity.position.z <= threshold + 1e-3);
                assert!(entity.position.z > threshold - lap - 1e-3);
            }
        }
        assert_eq!(state.phase(), RunPhase::Running);
        assert!(state.track.distance() > 2.0 * lap);
    }

    #[test]
    fn test_same_seed_same_run() {
        let script = |i: u32| match i % 97 {
            0 => Some(Intent::MoveLeftStart),
            20 => Some(Intent::MoveLeftStop),
            35 => Some(Intent::Jump),
            50 => Some(Intent::MoveRightStart),
            70 => Some(Intent::MoveRightStop),
            80 => Some(Intent::CrouchStart),
            90 => Some(Intent::CrouchStop),
            _ => None,
        };
        let mut a = running(1234, Settings::default());
        let mut b = running(1234, Settings::default());
        for i in 0..3_000 {
            let input = TickInput::from(script(i).into_iter().collect::<Vec<_>>());
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(FrameView::capture(&a), FrameView::capture(&b));
        assert_eq!(a.drain_events(), b.drain_events());
    }

    fn movement() -> impl Strategy<Value = Option<Intent>> {
        proptest::option::of(proptest::sample::select(vec![
            Intent::MoveLeftStart,
            Intent::MoveLeftStop,
            Intent::MoveRightStart,
            Intent::MoveRightStop,
            Intent::Jump,
            Intent::CrouchStart,
            Intent::CrouchStop,
        ]))
    }

    proptest! {
        #[test]
        fn prop_paused_ticks_change_nothing(
            seed in any::<u64>(),
            before in proptest::collection::vec(movement(), 0..200),
            during in proptest::collection::vec(movement(), 1..200),
        ) {
            let mut state = running(seed, Settings::default());
            for intent in before {
                tick(&mut state, &TickInput::from(intent.into_iter().collect::<Vec<_>>()), SIM_DT);
            }
            tick(&mut state, &TickInput::single(Intent::PauseToggle), SIM_DT);
            prop_assert_ne!(state.phase(), RunPhase::Running);

            let frozen = FrameView::capture(&state);
            let clocks = (state.score_clock, state.spawn_timer, state.time_ticks);
            state.drain_events();
            for intent in during {
                tick(&mut state, &TickInput::from(intent.into_iter().collect::<Vec<_>>()), SIM_DT);
            }
            prop_assert_eq!(FrameView::capture(&state), frozen);
            prop_assert_eq!((state.score_clock, state.spawn_timer, state.time_ticks), clocks);
            prop_assert!(state.events().is_empty());
        }
    }
}
