//! Per-frame view of the simulation for the presentation layer
//!
//! The renderer never reaches into `SimulationState`; it receives a
//! `FrameView` snapshot and the drained `GameEvent`s through a `FrameSink`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::effects::ActiveEffect;
use crate::sim::entities::{EntityId, EntityKind};
use crate::sim::state::{GameEvent, RunPhase, SimulationState};

/// Position and scale of a drawable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub transform: Transform,
    pub airborne: bool,
    pub crouching: bool,
}

/// An active obstacle or power-up. `size` is the full extent of its volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub size: Vec3,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    pub tick: u64,
    pub phase: RunPhase,
    pub score: u64,
    pub high_score: u64,
    pub speed: f32,
    pub player: PlayerView,
    /// Where the camera should sit: behind and above the player
    pub camera: Vec3,
    pub entities: Vec<EntityView>,
    /// Segment centres along z
    pub segments: Vec<f32>,
    pub effects: Vec<ActiveEffect>,
}

impl FrameView {
    pub fn capture(state: &SimulationState) -> Self {
        let player = &state.player;
        let camera = Vec3::new(
            player.position.x,
            player.position.y + 2.0,
            player.position.z + state.settings.camera_follow_offset,
        );

        Self {
            tick: state.time_ticks,
            phase: state.run.phase,
            score: state.run.score,
            high_score: state.run.high_score.best(),
            speed: state.run.speed,
            player: PlayerView {
                transform: Transform {
                    position: player.position,
                    scale: player.scale(),
                },
                airborne: player.airborne,
                crouching: player.crouching,
            },
            camera,
            entities: state
                .registry
                .active()
                .map(|e| EntityView {
                    id: e.id,
                    kind: e.kind,
                    position: e.position,
                    size: e.shape.half_extents() * 2.0,
                })
                .collect(),
            segments: state.track.segments().iter().map(|s| s.z).collect(),
            effects: state.effects.active().copied().collect(),
        }
    }
}

/// Receiver for frames and events
pub trait FrameSink {
    fn frame(&mut self, view: &FrameView);
    fn event(&mut self, event: &GameEvent);
}

/// Drain pending events into `sink`, then hand it the current frame
pub fn publish(state: &mut SimulationState, sink: &mut impl FrameSink) {
    for event in state.drain_events() {
        sink.event(&event);
    }
    sink.frame(&FrameView::capture(state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::input::Intent;
    use crate::settings::Settings;
    use crate::sim::tick::{TickInput, tick};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<FrameView>,
        events: Vec<GameEvent>,
    }

    impl FrameSink for Recorder {
        fn frame(&mut self, view: &FrameView) {
            self.frames.push(view.clone());
        }

        fn event(&mut self, event: &GameEvent) {
            self.events.push(*event);
        }
    }

    #[test]
    fn test_capture_lists_active_entities() {
        let settings = Settings::default();
        let mut state = SimulationState::new(11, settings.clone());
        let view = FrameView::capture(&state);
        assert_eq!(view.entities.len(), state.registry.active_count());
        assert_eq!(view.segments.len(), settings.segment_count as usize);
        assert_eq!(view.phase, RunPhase::Idle);

        let id = view.entities[0].id;
        state.registry.remove(id);
        let view = FrameView::capture(&state);
        assert!(view.entities.iter().all(|e| e.id != id));
    }

    #[test]
    fn test_camera_trails_player() {
        let settings = Settings::default();
        let state = SimulationState::new(12, settings.clone());
        let view = FrameView::capture(&state);
        let expected_z = state.player.position.z + settings.camera_follow_offset;
        assert!((view.camera.z - expected_z).abs() < 1e-6);
        assert!(view.camera.z > view.player.transform.position.z);
    }

    #[test]
    fn test_publish_drains_events() {
        let mut state = SimulationState::new(13, Settings::default());
        tick(&mut state, &TickInput::single(Intent::Restart), SIM_DT);

        let mut sink = Recorder::default();
        publish(&mut state, &mut sink);
        assert_eq!(sink.frames.len(), 1);
        assert!(sink.events.contains(&GameEvent::PhaseChanged {
            from: RunPhase::Idle,
            to: RunPhase::Running
        }));
        assert!(state.events().is_empty());

        publish(&mut state, &mut sink);
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn test_frame_serializes() {
        let state = SimulationState::new(14, Settings::default());
        let json = serde_json::to_string(&FrameView::capture(&state)).unwrap();
        assert!(json.contains("\"phase\":\"Idle\""));
        let back: FrameView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entities.len(), state.registry.active_count());
    }
}
