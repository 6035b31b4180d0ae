//! Runner simulation
//!
//! Track, pools, player, effects and collisions. Given the same seed,
//! settings and intents, a run replays identically: time only advances in
//! fixed ticks, randomness comes from the state's `Pcg32`, and entities are
//! visited in slot order.

pub mod collision;
pub mod effects;
pub mod entities;
pub mod player;
pub mod state;
pub mod tick;
pub mod track;
pub mod volume;

pub use collision::{Contact, ContactKind, first_obstacle, resolve};
pub use effects::{ActiveEffect, ApplyOutcome, EffectKind, EffectManager};
pub use entities::{DangerClass, Entity, EntityId, EntityKind, EntityRegistry, SpawnWindow};
pub use player::{Controls, Player};
pub use state::{Cadence, GameEvent, RunPhase, RunState, SimulationState};
pub use tick::{TickInput, tick};
pub use track::{Segment, SpatialRecycler, Track};
pub use volume::{Aabb, Shape, Sphere, Volume};
