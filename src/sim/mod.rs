//! Entity simulation core.
//!
//! Per tick, every entity flows through the same pipeline:
//! input → run flow → AI state machine → navigation and abilities → status
//! effects → motion resolver → obstacles and depth → detection refresh for the
//! next tick.
//!
//! [`SimulationPlugin`] installs the resources and schedules the systems; the
//! submodules hold the per-entity state and its plain-Rust logic so it can be
//! driven and tested without an `App`.

use bevy::prelude::*;

pub mod abilities;
pub mod ai;
pub mod clock;
pub mod components;
pub mod constants;
pub mod curve;
pub mod detection;
pub mod game;
pub mod input;
pub mod math;
pub mod movement;
pub mod navigation;
pub mod physics;
pub mod spawn;
pub mod status;
pub mod systems;

use crate::combat::CombatPlugin;

pub use abilities::{AbilityDefinitions, AbilityId, AbilityState, CardId};
pub use ai::{StateMachine, StateMachineDefinitions};
pub use clock::SimClock;
pub use components::{CaptureToggles, EntityKind, GameRng, SimEntity, SimulationSpeed};
pub use game::{GameFlow, GamePhase};
pub use navigation::Pathfinder;
pub use physics::PhysicsWorld;
pub use spawn::{spawn_entity, EntityBlueprint};

/// Installs the simulation resources and the full tick pipeline.
///
/// Resources already present in the app (a seeded [`GameRng`], loaded
/// definitions, a custom [`Pathfinder`], a configured [`GameFlow`]) are kept.
pub struct SimulationPlugin {
    pub tick_rate_hz: f32,
    /// Height of the flat ground plane, if there is one
    pub ground_height: Option<f32>,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            tick_rate_hz: constants::DEFAULT_TICK_RATE_HZ,
            ground_height: Some(0.0),
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let physics = match self.ground_height {
            Some(height) => PhysicsWorld::with_ground(height),
            None => PhysicsWorld::default(),
        };

        app.add_plugins(CombatPlugin)
            .insert_resource(SimClock::new(self.tick_rate_hz))
            .insert_resource(physics)
            .init_resource::<SimulationSpeed>()
            .init_resource::<GameRng>()
            .init_resource::<GameFlow>()
            .init_resource::<Pathfinder>()
            .init_resource::<AbilityDefinitions>()
            .init_resource::<StateMachineDefinitions>();

        systems::configure_simulation_ordering(app);
        systems::add_core_simulation_systems(app, || true);
    }
}
