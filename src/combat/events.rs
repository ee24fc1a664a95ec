//! Combat events
//!
//! Cross-entity traffic of the simulation. Entities never write into each
//! other's state directly; hits, deaths and state switches travel as events
//! and are applied or logged by the systems in [`super::systems`].

use bevy::prelude::*;

use crate::sim::abilities::AbilityId;
use crate::sim::ai::StateId;
use crate::sim::status::{DamageInfo, StatusEffectKind};

/// An interaction collider struck a target. Damage is pre-mitigation.
#[derive(Event, Clone, Debug)]
pub struct DamageEvent {
    /// Entity whose ability dealt the hit
    pub source: Entity,
    pub target: Entity,
    pub ability: AbilityId,
    pub damage: DamageInfo,
    /// Where the collider was when it connected
    pub hit_position: Vec3,
}

/// A hit after the target's resistances were applied.
#[derive(Event, Clone, Debug)]
pub struct DamageAppliedEvent {
    pub source: Entity,
    pub target: Entity,
    pub ability: AbilityId,
    /// Damage after resistances
    pub amount: f32,
    /// Status effect admitted by this hit, if any
    pub status_effect: Option<StatusEffectKind>,
    pub killing_blow: bool,
}

/// Event fired when an ability is activated
#[derive(Event, Clone, Debug)]
pub struct AbilityUsedEvent {
    pub caster: Entity,
    pub ability: AbilityId,
}

/// Event fired the tick an entity's health reaches zero
#[derive(Event, Clone, Debug)]
pub struct EntityDiedEvent {
    pub victim: Entity,
    /// Entity that dealt the killing blow
    pub killer: Option<Entity>,
}

/// An AI state machine switched state.
#[derive(Event, Clone, Debug)]
pub struct StateChangedEvent {
    pub entity: Entity,
    pub from: Option<StateId>,
    pub to: StateId,
}
