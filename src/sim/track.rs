//! Track segments and spatial recycling
//!
//! The world never scrolls: the player runs toward -z and anything that
//! falls more than the trailing margin behind is moved one full lap ahead.
//! Pools keep their size and slot order forever.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Entity, lateral_limit};
use crate::settings::Settings;

/// One tile of the tunnel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    /// Centre of the tile along z
    pub z: f32,
}

/// The recurring tunnel
#[derive(Debug, Clone)]
pub struct Track {
    segments: Vec<Segment>,
    segment_length: f32,
    trailing_margin: f32,
    /// Distance run since the track was built
    distance: f32,
}

impl Track {
    pub fn new(settings: &Settings) -> Self {
        let segments = (0..settings.segment_count)
            .map(|index| Segment {
                index,
                z: -(index as f32) * settings.segment_length,
            })
            .collect();
        Self {
            segments,
            segment_length: settings.segment_length,
            trailing_margin: settings.trailing_margin,
            distance: 0.0,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    pub fn length(&self) -> f32 {
        self.segment_length * self.segments.len() as f32
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Record forward travel. Segments are static in world space, so
    /// nothing moves here.
    pub fn advance(&mut self, delta: f32) {
        self.distance += delta.max(0.0);
    }

    /// Move every segment that is behind the player one lap ahead
    pub fn recycle_segments(&mut self, player_z: f32) -> usize {
        let threshold = player_z + self.trailing_margin;
        let lap = self.length();
        let mut moved = 0;
        for segment in &mut self.segments {
            while segment.z > threshold {
                segment.z -= lap;
                moved += 1;
            }
        }
        moved
    }

    /// Covered z range as (near edge, far edge), i.e. (max z, min z)
    pub fn coverage(&self) -> (f32, f32) {
        let half = self.segment_length / 2.0;
        let near = self.segments.iter().map(|s| s.z).fold(f32::NEG_INFINITY, f32::max);
        let far = self.segments.iter().map(|s| s.z).fold(f32::INFINITY, f32::min);
        (near + half, far - half)
    }
}

/// Recycles pooled entities the same way the track recycles segments
#[derive(Debug, Clone, Copy)]
pub struct SpatialRecycler {
    pub trailing_margin: f32,
    pub track_length: f32,
}

impl SpatialRecycler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            trailing_margin: settings.trailing_margin,
            track_length: settings.track_length(),
        }
    }

    /// Throw every active entity that is behind the player one lap ahead,
    /// with a fresh x (and y for airborne kinds). Returns how many moved.
    pub fn recycle(
        &self,
        entities: &mut [Entity],
        player_z: f32,
        settings: &Settings,
        rng: &mut impl Rng,
    ) -> usize {
        let threshold = player_z + self.trailing_margin;
        let mut moved = 0;
        for entity in entities.iter_mut().filter(|e| e.active) {
            if entity.position.z <= threshold {
                continue;
            }
            while entity.position.z > threshold {
                entity.position.z -= self.track_length;
            }
            let x_limit = lateral_limit(&entity.shape, settings);
            entity.position.x = rng.random_range(-x_limit..=x_limit);
            if entity.kind.is_airborne() {
                entity.position.y = entity.kind.draw_height(settings, rng);
            }
            moved += 1;
        }
        moved
    }
}
