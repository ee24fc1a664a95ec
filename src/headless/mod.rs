//! Headless scenario runs
//!
//! Runs a scenario without any graphical output, suitable for automated
//! testing and balancing.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario assets/scenarios/skirmish.json --seed 7
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "name": "duel",
//!   "entities": [
//!     { "name": "hero", "kind": "Player", "position": [0.0, 0.0, 0.0], "abilities": ["slash"] },
//!     { "name": "grunt", "kind": "Enemy", "position": [0.0, 0.0, -8.0], "state_machine": "grunt" }
//!   ],
//!   "max_duration_secs": 60,
//!   "random_seed": 7
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ObstacleConfig, ScenarioConfig};
pub use runner::{run_scenario, EntityResult, ScenarioOutcome, ScenarioResult, ScenarioRunner};
