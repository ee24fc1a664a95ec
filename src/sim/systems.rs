//! Simulation Systems API
//!
//! Wires every subsystem into the per-tick pipeline. Both the headless runner
//! and any future client should schedule the simulation through here rather
//! than picking systems out of the submodules.
//!
//! ## System Phases
//!
//! 1. **Sense** - clock, input feed, physics snapshot, ground contacts, run flow
//! 2. **Decide** - AI state machines, status effects
//! 3. **Act** - navigation, abilities, damage
//! 4. **Resolve** - motion, obstacles, depth, detection refresh for the next tick, logging
//!
//! ## Usage
//!
//! ```ignore
//! systems::configure_simulation_ordering(&mut app);
//! systems::add_core_simulation_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

pub use super::abilities::{manage_abilities, perform_abilities};
pub use super::ai::run_state_machines;
pub use super::clock::advance_clock;
pub use super::detection::refresh_detection;
pub use super::game::{apply_obstacles, manage_game_flow, track_depth};
pub use super::input::apply_scripted_input;
pub use super::movement::resolve_movement;
pub use super::navigation::{initialize_navigation, navigate_entities};
pub use super::physics::{probe_ground, sync_physics_world};
pub use super::status::manage_status_effects;
pub use crate::combat::systems::{apply_damage_events, record_combat_log};

/// System set labels for simulation ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationPhase {
    Sense,
    Decide,
    Act,
    Resolve,
}

/// Chain the phases. Call once during app setup.
pub fn configure_simulation_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            SimulationPhase::Sense,
            SimulationPhase::Decide,
            SimulationPhase::Act,
            SimulationPhase::Resolve,
        )
            .chain(),
    );
}

/// Adds the core simulation systems to the app.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - Gate for the whole pipeline (`|| true` when headless)
pub fn add_core_simulation_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.add_systems(
        Update,
        (
            advance_clock,
            apply_scripted_input,
            sync_physics_world,
            initialize_navigation,
            probe_ground,
            manage_game_flow,
        )
            .chain()
            .in_set(SimulationPhase::Sense)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (run_state_machines, manage_status_effects)
            .chain()
            .in_set(SimulationPhase::Decide)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (
            navigate_entities,
            perform_abilities,
            manage_abilities,
            apply_damage_events,
        )
            .chain()
            .in_set(SimulationPhase::Act)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (
            resolve_movement,
            sync_physics_world,
            apply_obstacles,
            track_depth,
            refresh_detection,
            record_combat_log,
        )
            .chain()
            .in_set(SimulationPhase::Resolve)
            .run_if(run_condition),
    );
}
