//! Homebound - Entity Simulation Core
//!
//! Tick-driven simulation of player and enemy entities: abilities and card
//! decks, AI state machines, navigation, status effects and motion, with a
//! headless runner for scripted scenarios.
//!
//! This library exposes the simulation modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;
pub mod sim;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::{ScenarioConfig, ScenarioOutcome, ScenarioResult, ScenarioRunner};
pub use settings::SimulationSettings;
pub use sim::{EntityBlueprint, SimulationPlugin};
