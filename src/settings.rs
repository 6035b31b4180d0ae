//! Simulation tuning
//!
//! Every tunable constant of a run lives here so the same binary can be
//! rebalanced from a JSON file. Speeds and physics values are per tick;
//! durations and cadences are seconds of simulated time.

use std::fmt;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_CADENCE;

/// Failure to read a settings file
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read settings: {err}"),
            Self::Parse(err) => write!(f, "invalid settings json: {err}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

/// Run tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Movement ===
    /// Forward distance covered per tick
    pub speed: f32,
    /// Sideways distance covered per tick per held direction
    pub lateral_speed: f32,
    /// Downward velocity change per airborne tick
    pub gravity: f32,
    /// Upward velocity set by a jump
    pub jump_strength: f32,
    /// Resting height of the player's origin
    pub ground_y: f32,
    /// Player box half extents while standing
    pub player_half_extents: Vec3,
    /// Vertical scale applied while crouching
    pub crouch_scale: f32,

    // === Track ===
    pub track_width: f32,
    pub segment_length: f32,
    pub segment_count: u32,
    /// Distance behind the player past which things are recycled
    pub trailing_margin: f32,
    /// How far behind the player the camera sits
    pub camera_follow_offset: f32,

    // === Obstacles ===
    pub ground_obstacles: u32,
    pub sky_obstacles: u32,
    pub ground_obstacle_half_extents: Vec3,
    pub sky_obstacle_radius: f32,
    /// Sky obstacle centre height range
    pub sky_band: (f32, f32),
    /// Minimum (x, z) distance between obstacles at placement
    pub obstacle_min_separation: f32,
    pub placement_max_retries: u32,
    /// Nothing is placed closer than this ahead of the player
    pub spawn_clearance: f32,

    // === Power-ups ===
    /// Fixed number of power-up slots
    pub powerup_pool: u32,
    /// Slots active when a run starts
    pub initial_powerups: u32,
    pub powerup_radius: f32,
    pub powerup_height: f32,
    pub powerup_min_separation: f32,
    pub powerup_spawn_interval: f32,
    pub powerup_spawn_probability: f64,
    pub pickup_radius: f32,

    // === Effects ===
    pub speed_debuff_factor: f32,
    pub speed_debuff_duration: f32,
    pub jump_boost_increment: f32,
    pub jump_boost_duration: f32,
    pub shield_duration: f32,

    // === Scoring ===
    /// Seconds of running per score point
    pub score_interval: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 0.2,
            lateral_speed: 0.15,
            gravity: 0.01,
            jump_strength: 0.25,
            ground_y: 1.15,
            player_half_extents: Vec3::new(0.5, 1.15, 0.5),
            crouch_scale: 0.5,

            track_width: 10.0,
            segment_length: 25.0,
            segment_count: 20,
            trailing_margin: 15.0,
            camera_follow_offset: 10.0,

            ground_obstacles: 12,
            sky_obstacles: 6,
            ground_obstacle_half_extents: Vec3::new(0.75, 0.75, 0.75),
            sky_obstacle_radius: 0.6,
            sky_band: (2.4, 2.8),
            obstacle_min_separation: 8.0,
            placement_max_retries: 32,
            spawn_clearance: 20.0,

            powerup_pool: 4,
            initial_powerups: 2,
            powerup_radius: 0.5,
            powerup_height: 1.2,
            powerup_min_separation: 12.0,
            powerup_spawn_interval: 3.0,
            powerup_spawn_probability: 0.5,
            pickup_radius: 1.5,

            speed_debuff_factor: 0.8,
            speed_debuff_duration: 5.0,
            jump_boost_increment: 0.1,
            jump_boost_duration: 5.0,
            shield_duration: 5.0,

            score_interval: 0.1,
        }
    }
}

impl Settings {
    /// Total length of one lap of the track
    pub fn track_length(&self) -> f32 {
        self.segment_length * self.segment_count as f32
    }

    /// Furthest the player's centre may stray from the track centreline
    pub fn x_boundary(&self) -> f32 {
        (self.track_width / 2.0 - self.player_half_extents.x).max(0.0)
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Read settings from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Clamp values that would break the simulation's invariants.
    ///
    /// Each correction is logged; nothing here is fatal.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.segment_count == 0 {
            log::warn!("segment_count must be positive, using {}", defaults.segment_count);
            self.segment_count = defaults.segment_count;
        }
        if self.segment_length <= 0.0 {
            log::warn!("segment_length must be positive, using {}", defaults.segment_length);
            self.segment_length = defaults.segment_length;
        }
        // Recycling inside the camera's view shows up as popping.
        if self.trailing_margin <= self.camera_follow_offset {
            let margin = self.camera_follow_offset + 1.0;
            log::warn!(
                "trailing_margin {} does not clear camera offset {}, using {}",
                self.trailing_margin,
                self.camera_follow_offset,
                margin
            );
            self.trailing_margin = margin;
        }
        if self.trailing_margin < self.segment_length / 2.0 {
            log::warn!(
                "trailing_margin {} is shorter than half a segment, using {}",
                self.trailing_margin,
                self.segment_length / 2.0
            );
            self.trailing_margin = self.segment_length / 2.0;
        }
        // The lap must reach a full segment past the margin, or recycled
        // segments stop covering the player.
        let min_count = ((self.trailing_margin + self.segment_length) / self.segment_length)
            .floor() as u32
            + 1;
        if self.segment_count < min_count {
            log::warn!(
                "segment_count {} cannot cover trailing_margin {}, using {}",
                self.segment_count,
                self.trailing_margin,
                min_count
            );
            self.segment_count = min_count;
        }
        let lap = self.track_length();
        if self.spawn_clearance.is_nan()
            || self.spawn_clearance < 0.0
            || self.spawn_clearance + self.trailing_margin >= lap
        {
            let clearance = (lap - self.trailing_margin) / 2.0;
            log::warn!("spawn_clearance leaves no room on the track, using {clearance}");
            self.spawn_clearance = clearance;
        }
        if !(0.0..=1.0).contains(&self.powerup_spawn_probability) {
            log::warn!(
                "powerup_spawn_probability {} outside [0, 1], clamping",
                self.powerup_spawn_probability
            );
            self.powerup_spawn_probability = self.powerup_spawn_probability.clamp(0.0, 1.0);
        }
        if self.initial_powerups > self.powerup_pool {
            log::warn!("initial_powerups exceeds powerup_pool, clamping");
            self.initial_powerups = self.powerup_pool;
        }
        if self.sky_band.0 > self.sky_band.1 {
            self.sky_band = (self.sky_band.1, self.sky_band.0);
        }
        if self.score_interval.is_nan() || self.score_interval < MIN_CADENCE {
            log::warn!(
                "score_interval {} is below {MIN_CADENCE}, using {}",
                self.score_interval,
                defaults.score_interval
            );
            self.score_interval = defaults.score_interval;
        }
        if self.powerup_spawn_interval.is_nan() || self.powerup_spawn_interval < MIN_CADENCE {
            log::warn!(
                "powerup_spawn_interval {} is below {MIN_CADENCE}, using {}",
                self.powerup_spawn_interval,
                defaults.powerup_spawn_interval
            );
            self.powerup_spawn_interval = defaults.powerup_spawn_interval;
        }
        self.crouch_scale = self.crouch_scale.clamp(0.1, 1.0);
        self
    }
}
