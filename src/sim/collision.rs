//! Collision resolution
//!
//! Obstacles use exact volume intersection against the player's box.
//! Power-ups use a centre distance check against a generous pickup radius,
//! since a near miss on a pickup costs nothing.

use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use super::entities::{Entity, EntityId, EntityKind};
use super::volume::{Aabb, Volume};

/// What the player touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Obstacle,
    PowerUp(EffectKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub entity: EntityId,
    pub kind: ContactKind,
}

/// Test the player against every active entity.
///
/// When `shielded`, obstacles are not tested at all. Contacts come back in
/// entity order.
pub fn resolve<'a>(
    player: &Aabb,
    entities: impl IntoIterator<Item = &'a Entity>,
    shielded: bool,
    pickup_radius: f32,
) -> Vec<Contact> {
    let player_volume = Volume::Box(*player);
    let player_center = player.center();
    let pickup_sq = pickup_radius * pickup_radius;

    entities
        .into_iter()
        .filter(|e| e.active)
        .filter_map(|e| match e.kind {
            EntityKind::GroundObstacle | EntityKind::SkyObstacle => {
                (!shielded && player_volume.intersects(&e.volume())).then_some(Contact {
                    entity: e.id,
                    kind: ContactKind::Obstacle,
                })
            }
            EntityKind::PowerUp(effect) => {
                (player_center.distance_squared(e.position) <= pickup_sq).then_some(Contact {
                    entity: e.id,
                    kind: ContactKind::PowerUp(effect),
                })
            }
        })
        .collect()
}

/// First obstacle among `contacts`, if any. Any one of them ends the run.
pub fn first_obstacle(contacts: &[Contact]) -> Option<&Contact> {
    contacts.iter().find(|c| c.kind == ContactKind::Obstacle)
}
