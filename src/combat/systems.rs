//! Combat systems
//!
//! ECS systems that apply hits and record what happened.

use bevy::prelude::*;

use super::events::*;
use super::log::{CombatLog, CombatLogEventType};
use crate::sim::clock::SimClock;
use crate::sim::components::SimEntity;
use crate::sim::status::StatusState;

/// Apply queued hits to their targets' status, reporting deaths.
///
/// Hits on entities that are already dead are dropped.
pub fn apply_damage_events(
    clock: Res<SimClock>,
    mut damage_events: EventReader<DamageEvent>,
    mut targets: Query<(&Transform, &SimEntity, &mut StatusState)>,
    mut applied_events: EventWriter<DamageAppliedEvent>,
    mut death_events: EventWriter<EntityDiedEvent>,
) {
    for event in damage_events.read() {
        let Ok((transform, sim_entity, mut status)) = targets.get_mut(event.target) else {
            continue;
        };
        if !sim_entity.capture.status || status.is_dead() {
            continue;
        }

        let had_effect = status.is_suffering_from(event.damage.status_effect.kind);
        let amount = status.take_damage(&event.damage, event.hit_position, transform.translation, clock.elapsed);
        let admitted = !had_effect && status.is_suffering_from(event.damage.status_effect.kind);
        let killing_blow = status.is_dead();

        applied_events.send(DamageAppliedEvent {
            source: event.source,
            target: event.target,
            ability: event.ability.clone(),
            amount,
            status_effect: admitted.then_some(event.damage.status_effect.kind),
            killing_blow,
        });

        if killing_blow {
            info!("{} died", sim_entity.name);
            death_events.send(EntityDiedEvent {
                victim: event.target,
                killer: Some(event.source),
            });
        }
    }
}

/// Record events to the combat log
pub fn record_combat_log(
    clock: Res<SimClock>,
    mut combat_log: ResMut<CombatLog>,
    mut applied_events: EventReader<DamageAppliedEvent>,
    mut ability_events: EventReader<AbilityUsedEvent>,
    mut death_events: EventReader<EntityDiedEvent>,
    mut state_events: EventReader<StateChangedEvent>,
    entities: Query<&SimEntity>,
) {
    combat_log.sim_time = clock.elapsed;

    let name_of = |entity: Entity| -> String {
        entities
            .get(entity)
            .map(|e| e.name.clone())
            .unwrap_or_else(|_| "Unknown".to_string())
    };

    for event in ability_events.read() {
        let caster = name_of(event.caster);
        let message = format!("{} uses {}", caster, event.ability);
        combat_log.log(CombatLogEventType::AbilityUsed, message);
    }

    for event in applied_events.read() {
        let source = name_of(event.source);
        let target = name_of(event.target);
        let message = format!(
            "{}'s {} hits {} for {:.0} damage",
            source, event.ability, target, event.amount
        );
        if let Some(effect) = event.status_effect {
            combat_log.log(
                CombatLogEventType::StatusApplied,
                format!("{} is {:?} by {}'s {}", target, effect, source, event.ability),
            );
        }
        combat_log.log_damage(
            source,
            target,
            event.ability.to_string(),
            event.amount,
            event.killing_blow,
            message,
        );
    }

    for event in state_events.read() {
        let entity = name_of(event.entity);
        let from = event.from.as_ref().map(|s| s.to_string());
        let message = format!(
            "{} switches from {} to {}",
            entity,
            from.as_deref().unwrap_or("nothing"),
            event.to
        );
        combat_log.log_state_change(entity, from, event.to.to_string(), message);
    }

    for event in death_events.read() {
        let victim = name_of(event.victim);
        let killer = event.killer.map(name_of);
        let message = match &killer {
            Some(killer) => format!("{} has been slain by {}", victim, killer),
            None => format!("{} has died", victim),
        };
        combat_log.log_death(victim, killer, message);
    }
}
