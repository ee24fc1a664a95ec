//! Combat system
//!
//! Cross-entity side of the simulation:
//! - Hit, death and state-change events
//! - Damage application against status
//! - Combat logging

use bevy::prelude::*;

pub mod events;
pub mod log;
pub mod systems;

use events::*;

/// Registers combat events and the combat log.
///
/// The systems themselves are scheduled by
/// [`crate::sim::systems::add_core_simulation_systems`].
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageEvent>()
            .add_event::<DamageAppliedEvent>()
            .add_event::<AbilityUsedEvent>()
            .add_event::<EntityDiedEvent>()
            .add_event::<StateChangedEvent>()
            .init_resource::<log::CombatLog>();
    }
}
