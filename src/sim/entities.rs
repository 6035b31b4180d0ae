//! Entity registry
//!
//! Owns every obstacle and power-up in fixed-size pools. Slots are created
//! when the world is built and never freed during a run: collection only
//! deactivates a slot and the spawn timer reactivates it later.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use super::volume::{Shape, Volume};
use crate::settings::Settings;

pub type EntityId = u32;

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Sits on the floor, must be jumped or dodged
    GroundObstacle,
    /// Floats at head height, must be ducked or dodged
    SkyObstacle,
    PowerUp(EffectKind),
}

/// Entities only keep their distance from others in the same class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerClass {
    Obstacle,
    Pickup,
}

impl EntityKind {
    pub fn danger_class(&self) -> DangerClass {
        match self {
            EntityKind::GroundObstacle | EntityKind::SkyObstacle => DangerClass::Obstacle,
            EntityKind::PowerUp(_) => DangerClass::Pickup,
        }
    }

    pub fn is_obstacle(&self) -> bool {
        self.danger_class() == DangerClass::Obstacle
    }

    /// Entities whose height is randomized on placement
    pub fn is_airborne(&self) -> bool {
        matches!(self, EntityKind::SkyObstacle)
    }

    pub fn shape(&self, settings: &Settings) -> Shape {
        match self {
            EntityKind::GroundObstacle => Shape::Box {
                half_extents: settings.ground_obstacle_half_extents,
            },
            EntityKind::SkyObstacle => Shape::Sphere {
                radius: settings.sky_obstacle_radius,
            },
            EntityKind::PowerUp(_) => Shape::Sphere {
                radius: settings.powerup_radius,
            },
        }
    }

    /// Centre height for a fresh placement
    pub fn draw_height(&self, settings: &Settings, rng: &mut impl Rng) -> f32 {
        match self {
            EntityKind::GroundObstacle => settings.ground_obstacle_half_extents.y,
            EntityKind::SkyObstacle => {
                let (low, high) = settings.sky_band;
                rng.random_range(low..=high)
            }
            EntityKind::PowerUp(_) => settings.powerup_height,
        }
    }
}

/// Widest |x| at which a shape still fits inside the track walls
pub fn lateral_limit(shape: &Shape, settings: &Settings) -> f32 {
    (settings.track_width / 2.0 - shape.half_extents().x).max(0.0)
}

/// A pooled obstacle or power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub shape: Shape,
    pub active: bool,
}

impl Entity {
    /// Bounding volume at the current position
    pub fn volume(&self) -> Volume {
        self.shape.volume_at(self.position)
    }
}

/// Stretch of track ahead of the player where entities may be placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnWindow {
    /// Closest z to the player (larger value, forward is -z)
    pub near_z: f32,
    /// Furthest z from the player
    pub far_z: f32,
}

impl SpawnWindow {
    /// Everything between the spawn clearance and one lap ahead
    pub fn ahead_of(player_z: f32, settings: &Settings) -> Self {
        Self {
            near_z: player_z - settings.spawn_clearance,
            far_z: player_z + settings.trailing_margin - settings.track_length(),
        }
    }

    fn draw_z(&self, rng: &mut impl Rng) -> f32 {
        if self.far_z >= self.near_z {
            self.near_z
        } else {
            rng.random_range(self.far_z..=self.near_z)
        }
    }
}

/// Outcome of a placement batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub placed: Vec<EntityId>,
    /// Placements that ran out of retries and took the best candidate
    pub fallbacks: u32,
}

/// Owns all entities and their slots
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Build the pools for a fresh run with the player at `player_z`
    pub fn populate(settings: &Settings, player_z: f32, rng: &mut impl Rng) -> Self {
        let mut registry = Self::new();
        let window = SpawnWindow::ahead_of(player_z, settings);

        let mut fallbacks = 0;
        for (kind, count) in [
            (EntityKind::GroundObstacle, settings.ground_obstacles),
            (EntityKind::SkyObstacle, settings.sky_obstacles),
        ] {
            let report = registry.place_non_overlapping(
                kind,
                count as usize,
                settings.obstacle_min_separation,
                window,
                settings,
                rng,
            );
            fallbacks += report.fallbacks;
        }

        for _ in 0..settings.initial_powerups {
            let kind = EntityKind::PowerUp(EffectKind::random(rng));
            let report = registry.place_non_overlapping(
                kind,
                1,
                settings.powerup_min_separation,
                window,
                settings,
                rng,
            );
            fallbacks += report.fallbacks;
        }
        let idle_slots = settings.powerup_pool.saturating_sub(settings.initial_powerups);
        for _ in 0..idle_slots {
            registry.reserve_slot(EntityKind::PowerUp(EffectKind::SpeedDebuff), settings);
        }

        log::debug!(
            "Populated {} entity slots ({} active, {} placement fallbacks)",
            registry.capacity(),
            registry.active_count(),
            fallbacks
        );
        registry
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an active entity at an exact position
    pub fn insert(&mut self, kind: EntityKind, position: Vec3, settings: &Settings) -> EntityId {
        let id = self.allocate_id();
        self.entities.push(Entity {
            id,
            kind,
            position,
            shape: kind.shape(settings),
            active: true,
        });
        id
    }

    /// Add an inactive slot that a later spawn can fill
    fn reserve_slot(&mut self, kind: EntityKind, settings: &Settings) -> EntityId {
        let id = self.insert(kind, Vec3::ZERO, settings);
        if let Some(entity) = self.entities.last_mut() {
            entity.active = false;
        }
        id
    }

    /// Place `count` new entities of `kind`, keeping `min_separation` on
    /// the (x, z) plane from active entities of the same danger class.
    pub fn place_non_overlapping(
        &mut self,
        kind: EntityKind,
        count: usize,
        min_separation: f32,
        window: SpawnWindow,
        settings: &Settings,
        rng: &mut impl Rng,
    ) -> PlacementReport {
        let mut report = PlacementReport::default();
        for _ in 0..count {
            let (position, fell_back) =
                self.sample_position(kind, min_separation, window, settings, rng);
            if fell_back {
                report.fallbacks += 1;
            }
            report.placed.push(self.insert(kind, position, settings));
        }
        report
    }

    /// Rejection-sample a position, bounded by `placement_max_retries`.
    ///
    /// Returns the position and whether the retries were exhausted, in which
    /// case the candidate with the most clearance is used.
    fn sample_position(
        &self,
        kind: EntityKind,
        min_separation: f32,
        window: SpawnWindow,
        settings: &Settings,
        rng: &mut impl Rng,
    ) -> (Vec3, bool) {
        let class = kind.danger_class();
        let x_limit = lateral_limit(&kind.shape(settings), settings);
        let mut best: Option<(Vec3, f32)> = None;

        for _ in 0..=settings.placement_max_retries {
            let candidate = Vec3::new(
                rng.random_range(-x_limit..=x_limit),
                kind.draw_height(settings, rng),
                window.draw_z(rng),
            );
            let clearance = self.clearance(candidate, class);
            if clearance >= min_separation {
                return (candidate, false);
            }
            if best.is_none_or(|(_, c)| clearance > c) {
                best = Some((candidate, clearance));
            }
        }

        let (position, clearance) = best.unwrap_or((Vec3::new(0.0, 0.0, window.near_z), 0.0));
        log::debug!(
            "Placement of {:?} exhausted retries, accepting clearance {:.2} < {:.2}",
            kind,
            clearance,
            min_separation
        );
        (position, true)
    }

    /// Distance on the (x, z) plane to the nearest active entity of `class`
    fn clearance(&self, point: Vec3, class: DangerClass) -> f32 {
        self.entities
            .iter()
            .filter(|e| e.active && e.kind.danger_class() == class)
            .map(|e| {
                let dx = e.position.x - point.x;
                let dz = e.position.z - point.z;
                (dx * dx + dz * dz).sqrt()
            })
            .fold(f32::INFINITY, f32::min)
    }

    /// One spawn trial: with `probability`, fill one idle power-up slot.
    pub fn spawn_power_up(
        &mut self,
        probability: f64,
        window: SpawnWindow,
        settings: &Settings,
        rng: &mut impl Rng,
    ) -> Option<EntityId> {
        if !rng.random_bool(probability.clamp(0.0, 1.0)) {
            return None;
        }
        let slot = self
            .entities
            .iter()
            .position(|e| !e.active && matches!(e.kind, EntityKind::PowerUp(_)))?;

        let kind = EntityKind::PowerUp(EffectKind::random(rng));
        let (position, _) =
            self.sample_position(kind, settings.powerup_min_separation, window, settings, rng);

        let entity = &mut self.entities[slot];
        entity.kind = kind;
        entity.shape = kind.shape(settings);
        entity.position = position;
        entity.active = true;
        log::debug!("Spawned {:?} (id {}) at z {:.1}", kind, entity.id, position.z);
        Some(entity.id)
    }

    /// Deactivate an entity. Its slot stays allocated.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id && e.active) {
            Some(entity) => {
                entity.active = false;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Every slot, active or not, in id order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn active(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn active_count_of(&self, class: DangerClass) -> usize {
        self.active().filter(|e| e.kind.danger_class() == class).count()
    }

    /// Number of slots, which never changes during a run
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }
}
