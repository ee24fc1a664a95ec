//! Ability Engine
//!
//! Abilities are timelines of events loaded from `assets/config/abilities.ron`.
//! Every tick an entity's [`AbilityState`] turns pressed buttons into
//! activations, runs each active ability's slot, and pushes what its
//! interaction colliders hit into [`DamageEvent`]s.

use bevy::prelude::*;

pub mod cards;
pub mod config;
pub mod engine;
pub mod logic;

pub use cards::{AbilityCards, AbilityDeck, AbilityHand};
pub use config::{
    load_ability_definitions, AbilityConfig, AbilityDefinitions, AbilityEvent, AbilityId, ActivationKind, CardId,
    CooldownConfig, CooldownKind,
};
pub use engine::{AbilityCooldown, AbilityState, AbilityStateInfo, ActiveAbility};
pub use logic::{AbilityContext, AbilityLogic, HitRecord};

use crate::combat::events::{AbilityUsedEvent, DamageEvent};
use crate::sim::clock::SimClock;
use crate::sim::components::{GameRng, SimEntity};
use crate::sim::detection::DetectionState;
use crate::sim::input::InputState;
use crate::sim::physics::{CollisionState, PhysicsWorld};

/// Turn this tick's input into ability activations.
#[allow(clippy::type_complexity)]
pub fn perform_abilities(
    clock: Res<SimClock>,
    definitions: Res<AbilityDefinitions>,
    mut rng: ResMut<GameRng>,
    mut used_events: EventWriter<AbilityUsedEvent>,
    mut query: Query<(
        Entity,
        &SimEntity,
        &Transform,
        &InputState,
        &CollisionState,
        &DetectionState,
        &mut AbilityState,
        Option<&mut AbilityCards>,
    )>,
) {
    for (entity, sim_entity, transform, input, collision, detection, mut abilities, mut cards) in query.iter_mut() {
        if !sim_entity.capture.abilities {
            continue;
        }
        let ctx = AbilityContext {
            entity,
            now: clock.elapsed,
            dt: clock.delta,
            tick: clock.tick,
            transform,
            collision,
            detection: detection.info(),
            input,
        };

        if let Some(ability) = abilities.perform_abilities(&definitions, &ctx, cards.as_deref_mut(), rng.rng_mut()) {
            debug!("{} activated {}", sim_entity.name, ability);
            used_events.send(AbilityUsedEvent {
                caster: entity,
                ability,
            });
        }
    }
}

/// Advance every running ability and report its hits.
#[allow(clippy::type_complexity)]
pub fn manage_abilities(
    clock: Res<SimClock>,
    definitions: Res<AbilityDefinitions>,
    physics: Res<PhysicsWorld>,
    mut damage_events: EventWriter<DamageEvent>,
    mut query: Query<(
        Entity,
        &SimEntity,
        &Transform,
        &InputState,
        &CollisionState,
        &DetectionState,
        &mut AbilityState,
    )>,
) {
    for (entity, sim_entity, transform, input, collision, detection, mut abilities) in query.iter_mut() {
        if !sim_entity.capture.abilities {
            continue;
        }
        let ctx = AbilityContext {
            entity,
            now: clock.elapsed,
            dt: clock.delta,
            tick: clock.tick,
            transform,
            collision,
            detection: detection.info(),
            input,
        };

        for hit in abilities.manage_abilities(&definitions, &ctx, &*physics) {
            damage_events.send(DamageEvent {
                source: entity,
                target: hit.target,
                ability: hit.ability,
                damage: hit.damage,
                hit_position: hit.hit_position,
            });
        }
    }
}
