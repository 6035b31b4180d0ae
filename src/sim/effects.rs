//! Timed power-up effects
//!
//! Each effect kind has at most one active instance. Expiry is an explicit
//! countdown advanced by the tick, so a reversal can only happen inside the
//! tick loop and happens exactly once per activation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::state::{GameEvent, RunState};
use crate::settings::Settings;

/// Power-up effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Slows the world down; stacks by count
    SpeedDebuff,
    /// Higher jumps
    JumpBoost,
    /// Obstacles are harmless, steering is locked
    Shield,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [
        EffectKind::SpeedDebuff,
        EffectKind::JumpBoost,
        EffectKind::Shield,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Seconds an activation lasts
    pub fn duration(&self, settings: &Settings) -> f32 {
        match self {
            EffectKind::SpeedDebuff => settings.speed_debuff_duration,
            EffectKind::JumpBoost => settings.jump_boost_duration,
            EffectKind::Shield => settings.shield_duration,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::SpeedDebuff => "speed-debuff",
            EffectKind::JumpBoost => "jump-boost",
            EffectKind::Shield => "shield",
        }
    }
}

/// A running effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    /// Seconds until expiry
    pub remaining: f32,
    /// Factor or increment that was applied
    pub magnitude: f32,
    /// Applications folded into this instance (always 1 unless stackable)
    pub stacks: u32,
}

/// Result of collecting a power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Activated,
    /// Stackable effect already running; stacked and timer restarted
    Refreshed,
    /// Non-stacking effect already running; nothing changed
    Ignored,
}

/// Active effects, one slot per kind
#[derive(Debug, Clone, Default)]
pub struct EffectManager {
    speed_debuff: Option<ActiveEffect>,
    jump_boost: Option<ActiveEffect>,
    shield: Option<ActiveEffect>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: EffectKind) -> &Option<ActiveEffect> {
        match kind {
            EffectKind::SpeedDebuff => &self.speed_debuff,
            EffectKind::JumpBoost => &self.jump_boost,
            EffectKind::Shield => &self.shield,
        }
    }

    fn slot_mut(&mut self, kind: EffectKind) -> &mut Option<ActiveEffect> {
        match kind {
            EffectKind::SpeedDebuff => &mut self.speed_debuff,
            EffectKind::JumpBoost => &mut self.jump_boost,
            EffectKind::Shield => &mut self.shield,
        }
    }

    pub fn get(&self, kind: EffectKind) -> Option<&ActiveEffect> {
        self.slot(kind).as_ref()
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Obstacles cannot end the run
    pub fn shielded(&self) -> bool {
        self.shield.is_some()
    }

    pub fn speed_debuff_stacks(&self) -> u32 {
        self.speed_debuff.map(|e| e.stacks).unwrap_or(0)
    }

    /// Active effects in a fixed order
    pub fn active(&self) -> impl Iterator<Item = &ActiveEffect> {
        [&self.speed_debuff, &self.jump_boost, &self.shield]
            .into_iter()
            .filter_map(|slot| slot.as_ref())
    }

    /// Collect a power-up of `kind`
    pub fn apply(
        &mut self,
        kind: EffectKind,
        run: &mut RunState,
        player: &mut Player,
        settings: &Settings,
        events: &mut Vec<GameEvent>,
    ) -> ApplyOutcome {
        let duration = kind.duration(settings);

        let outcome = match kind {
            EffectKind::SpeedDebuff => {
                let factor = settings.speed_debuff_factor;
                run.speed *= factor;
                if let Some(effect) = self.speed_debuff.as_mut() {
                    effect.stacks += 1;
                    effect.remaining = duration;
                    ApplyOutcome::Refreshed
                } else {
                    self.speed_debuff = Some(ActiveEffect {
                        kind,
                        remaining: duration,
                        magnitude: factor,
                        stacks: 1,
                    });
                    ApplyOutcome::Activated
                }
            }
            EffectKind::JumpBoost | EffectKind::Shield if self.is_active(kind) => {
                ApplyOutcome::Ignored
            }
            EffectKind::JumpBoost => {
                let increment = settings.jump_boost_increment;
                player.jump_strength += increment;
                self.jump_boost = Some(ActiveEffect {
                    kind,
                    remaining: duration,
                    magnitude: increment,
                    stacks: 1,
                });
                ApplyOutcome::Activated
            }
            EffectKind::Shield => {
                player.lateral_locked = true;
                self.shield = Some(ActiveEffect {
                    kind,
                    remaining: duration,
                    magnitude: 1.0,
                    stacks: 1,
                });
                ApplyOutcome::Activated
            }
        };

        if outcome != ApplyOutcome::Ignored {
            log::debug!("{} {:?} for {:.1}s", kind.as_str(), outcome, duration);
            events.push(GameEvent::PowerUpActivated {
                kind,
                duration_secs: duration,
            });
        }
        outcome
    }

    /// Count down every active effect and revert the ones that run out
    pub fn advance(
        &mut self,
        dt: f32,
        run: &mut RunState,
        player: &mut Player,
        events: &mut Vec<GameEvent>,
    ) {
        for kind in EffectKind::ALL {
            let slot = self.slot_mut(kind);
            let expired = match slot.as_mut() {
                Some(effect) => {
                    effect.remaining -= dt;
                    effect.remaining <= 0.0
                }
                None => false,
            };
            if !expired {
                continue;
            }
            if let Some(effect) = slot.take() {
                revert(&effect, run, player);
                log::debug!("{} expired", kind.as_str());
                events.push(GameEvent::PowerUpExpired { kind });
            }
        }
    }

    /// Revert and drop every active effect
    pub fn cancel_all(&mut self, run: &mut RunState, player: &mut Player, events: &mut Vec<GameEvent>) {
        for kind in EffectKind::ALL {
            if let Some(effect) = self.slot_mut(kind).take() {
                revert(&effect, run, player);
                events.push(GameEvent::PowerUpExpired { kind });
            }
        }
    }
}

fn revert(effect: &ActiveEffect, run: &mut RunState, player: &mut Player) {
    match effect.kind {
        EffectKind::SpeedDebuff => run.speed = run.base_speed,
        EffectKind::JumpBoost => player.jump_strength -= effect.magnitude,
        EffectKind::Shield => player.lateral_locked = false,
    }
}
