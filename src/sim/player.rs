//! Player controller
//!
//! Forward motion, lane-free lateral steering clamped to the track, jump
//! arcs under constant gravity, and crouching. The bounding box is derived
//! from the live pose whenever it is asked for.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::volume::Aabb;
use crate::settings::Settings;

/// Latched intents read by the controller each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub move_left: bool,
    pub move_right: bool,
    pub crouch: bool,
    /// One-shot, cleared once a tick has seen it
    pub jump: bool,
}

/// The runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    pub velocity_y: f32,
    /// Upward velocity a jump starts with
    pub jump_strength: f32,
    pub airborne: bool,
    pub crouching: bool,
    /// Vertical scale of the visual and the box (1.0 standing)
    pub scale_y: f32,
    /// Steering disabled (while shielded)
    pub lateral_locked: bool,
    /// Standing half extents
    half_extents: Vec3,
}

impl Player {
    pub fn new(settings: &Settings) -> Self {
        Self {
            position: Vec3::new(0.0, settings.ground_y, 0.0),
            velocity_y: 0.0,
            jump_strength: settings.jump_strength,
            airborne: false,
            crouching: false,
            scale_y: 1.0,
            lateral_locked: false,
            half_extents: settings.player_half_extents,
        }
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        !self.airborne
    }

    /// Run one tick of movement.
    ///
    /// Holding both directions cancels out. A jump while crouched is
    /// ignored, and crouching while airborne waits for the landing.
    pub fn apply_intents(
        &mut self,
        move_left: bool,
        move_right: bool,
        jump_pressed: bool,
        crouch_held: bool,
        speed: f32,
        lateral_speed: f32,
        settings: &Settings,
    ) {
        self.position.z -= speed;

        if !self.lateral_locked {
            if move_left {
                self.position.x -= lateral_speed;
            }
            if move_right {
                self.position.x += lateral_speed;
            }
        }
        let bound = settings.x_boundary();
        self.position.x = self.position.x.clamp(-bound, bound);

        if self.grounded() {
            self.crouching = crouch_held;
        }

        if jump_pressed && self.grounded() && !self.crouching {
            self.velocity_y = self.jump_strength;
            self.airborne = true;
        }

        if self.airborne {
            self.position.y += self.velocity_y;
            self.velocity_y -= settings.gravity;
            if self.position.y <= settings.ground_y {
                self.position.y = settings.ground_y;
                self.velocity_y = 0.0;
                self.airborne = false;
                self.crouching = crouch_held;
            }
        }

        self.scale_y = if self.crouching {
            settings.crouch_scale
        } else {
            1.0
        };
    }

    /// Tick with latched controls
    pub fn step(
        &mut self,
        controls: &Controls,
        speed: f32,
        lateral_speed: f32,
        settings: &Settings,
    ) {
        self.apply_intents(
            controls.move_left,
            controls.move_right,
            controls.jump,
            controls.crouch,
            speed,
            lateral_speed,
            settings,
        );
    }

    /// Visual scale of the runner
    pub fn scale(&self) -> Vec3 {
        Vec3::new(1.0, self.scale_y, 1.0)
    }

    /// Bounding box for the current pose. Crouching shrinks the box from
    /// the top so the feet stay where they are.
    pub fn volume(&self) -> Aabb {
        let half = self.half_extents * self.scale();
        let drop = self.half_extents.y - half.y;
        Aabb::from_center(self.position - Vec3::Y * drop, half)
    }
}
