//! Status Effect Tracker
//!
//! Health, resistances and timed status effects for one entity. Effects are
//! re-read every tick to produce one movement override (knockback) and one
//! movement modifier (slow, stun); later effects in the list win over earlier
//! ones of the same category.
//!
//! Same-kind effects never stack: a second SLOWED while one is active is
//! ignored rather than refreshed.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::clock::SimClock;
use super::components::SimEntity;
use super::curve::{time_ratio, EasingCurve};
use super::movement::{MovementInfo, MovementModifier, MovementSource};

/// How incoming damage is mitigated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    None,
    Physical,
    Magical,
    /// Ignores all resistances
    True,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectKind {
    #[default]
    None,
    Stunned,
    Slowed,
    Knockback,
}

/// A status effect definition carried by damage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    /// Duration in seconds
    pub length: f32,
    pub curve: EasingCurve,
    /// Knockback distance, or movement effectiveness for SLOWED
    pub strength: f32,
}

/// Damage payload delivered by an ability hit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageInfo {
    pub value: f32,
    pub damage_type: DamageType,
    pub status_effect: StatusEffect,
}

/// Resistance fractions in `[-1, 1]`. Zero means no mitigation is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseAttributes {
    pub physical: f32,
    pub magical: f32,
}

/// Static survivability stats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub max_health: f32,
    pub defense: DefenseAttributes,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            defense: DefenseAttributes::default(),
        }
    }
}

/// An effect currently applied to the entity.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveStatusEffect {
    pub effect: StatusEffect,
    /// Entity position when the effect landed
    pub start_position: Vec3,
    /// Where the hit connected
    pub impact_point: Vec3,
    /// Unit vector from the impact point toward the entity
    pub hit_direction: Vec3,
    pub start_time: f32,
    pub end_time: f32,
}

impl ActiveStatusEffect {
    pub fn new(effect: StatusEffect, start_position: Vec3, impact_point: Vec3, now: f32) -> Self {
        let hit_direction = (start_position - impact_point).normalize_or_zero();
        Self {
            end_time: now + effect.length,
            effect,
            start_position,
            impact_point,
            hit_direction,
            start_time: now,
        }
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now > self.end_time
    }

    /// Knockback push for this tick.
    fn knockback_velocity(&self, now: f32) -> Vec3 {
        let speed = if self.effect.length > f32::EPSILON {
            self.effect.strength / self.effect.length
        } else {
            self.effect.strength
        };
        let ratio = time_ratio(now, self.start_time, self.end_time);
        self.hit_direction * speed * self.effect.curve.evaluate(ratio)
    }
}

/// Read-only status snapshot for AI and external consumers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusInfo {
    pub health: f32,
    pub health_percent: f32,
    pub effects: SmallVec<[StatusEffectKind; 4]>,
}

/// Live health and effect state of one entity.
#[derive(Component, Clone, Debug)]
pub struct StatusState {
    pub config: StatusConfig,
    health: f32,
    effects: Vec<ActiveStatusEffect>,
    movement_override: MovementInfo,
    movement_modifier: MovementModifier,
}

impl StatusState {
    pub fn new(config: StatusConfig) -> Self {
        Self {
            health: config.max_health,
            config,
            effects: Vec::new(),
            movement_override: MovementInfo::NONE,
            movement_modifier: MovementModifier::NONE,
        }
    }

    /// Recompute the aggregate override and modifier, then drop expired effects.
    pub fn manage_status_effects(&mut self, now: f32) {
        let mut movement_override = MovementInfo::NONE;
        let mut movement_modifier = MovementModifier::NONE;

        for active in &self.effects {
            match active.effect.kind {
                StatusEffectKind::Knockback => {
                    movement_override =
                        MovementInfo::new(MovementSource::Status, active.knockback_velocity(now), false);
                }
                StatusEffectKind::Slowed => {
                    movement_modifier = MovementModifier {
                        source: MovementSource::Status,
                        force: Vec3::ZERO,
                        effectiveness: active.effect.strength.clamp(0.0, 1.0),
                    };
                }
                StatusEffectKind::Stunned => {
                    movement_modifier = MovementModifier {
                        source: MovementSource::Status,
                        force: Vec3::ZERO,
                        effectiveness: 0.0,
                    };
                }
                StatusEffectKind::None => {}
            }
        }

        self.movement_override = movement_override;
        self.movement_modifier = movement_modifier;
        self.effects.retain(|e| !e.is_expired(now));
    }

    /// Apply a hit. The status effect is admitted before health is removed.
    ///
    /// Returns the damage actually taken after resistances.
    pub fn take_damage(&mut self, damage: &DamageInfo, hit_position: Vec3, position: Vec3, now: f32) -> f32 {
        if damage.status_effect.kind != StatusEffectKind::None {
            self.add_effect(damage.status_effect.clone(), position, hit_position, now);
        }

        let resisted = self.resisted_damage(damage);
        self.remove_health(resisted);
        resisted
    }

    /// Admit an effect unless one of the same kind is already active.
    pub fn add_effect(&mut self, effect: StatusEffect, position: Vec3, impact_point: Vec3, now: f32) -> bool {
        if effect.kind == StatusEffectKind::None || self.is_suffering_from(effect.kind) {
            return false;
        }
        self.effects.push(ActiveStatusEffect::new(effect, position, impact_point, now));
        true
    }

    /// Damage after resistances. A zero resist means "not configured", never full immunity.
    pub fn resisted_damage(&self, damage: &DamageInfo) -> f32 {
        let resist = match damage.damage_type {
            DamageType::Physical => self.config.defense.physical,
            DamageType::Magical => self.config.defense.magical,
            DamageType::True | DamageType::None => 0.0,
        };
        if resist == 0.0 {
            return damage.value;
        }
        damage.value - damage.value * resist
    }

    pub fn add_health(&mut self, value: f32) {
        self.health = (self.health + value).min(self.config.max_health);
    }

    pub fn remove_health(&mut self, value: f32) {
        self.health = (self.health - value).max(0.0);
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    /// `health / max`, or exactly 0 once health hits 0.
    pub fn health_percent(&self) -> f32 {
        if self.health <= 0.0 || self.config.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.config.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_suffering_from(&self, kind: StatusEffectKind) -> bool {
        self.effects.iter().any(|e| e.effect.kind == kind)
    }

    pub fn effect_count(&self, kind: StatusEffectKind) -> usize {
        self.effects.iter().filter(|e| e.effect.kind == kind).count()
    }

    pub fn effects(&self) -> &[ActiveStatusEffect] {
        &self.effects
    }

    pub fn movement_override(&self) -> MovementInfo {
        self.movement_override
    }

    pub fn movement_modifier(&self) -> MovementModifier {
        self.movement_modifier
    }

    pub fn info(&self) -> StatusInfo {
        StatusInfo {
            health: self.health,
            health_percent: self.health_percent(),
            effects: self.effects.iter().map(|e| e.effect.kind).collect(),
        }
    }
}

/// Tick every entity's status effects.
pub fn manage_status_effects(clock: Res<SimClock>, mut query: Query<(&SimEntity, &mut StatusState)>) {
    for (entity, mut status) in query.iter_mut() {
        if entity.capture.status {
            status.manage_status_effects(clock.elapsed);
        }
    }
}
