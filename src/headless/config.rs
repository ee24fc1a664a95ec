//! JSON scenario configuration for headless runs
//!
//! A scenario lists the entities to spawn, static obstacles, and how long the
//! run may last. Ability and AI definitions are referenced by path.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::sim::constants::{DEFAULT_MAX_DURATION_SECS, DEFAULT_TICK_RATE_HZ};
use crate::sim::game::GameFlowConfig;
use crate::sim::physics::LayerMask;
use crate::sim::spawn::EntityBlueprint;

/// Static terrain box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub center: Vec3,
    pub half_extents: Vec3,
    /// Layers whose entities are stopped when they enter the box
    #[serde(default)]
    pub stop_mask: Option<LayerMask>,
}

/// Headless scenario loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Height of the flat ground plane; `null` for no ground
    #[serde(default = "default_ground_height")]
    pub ground_height: Option<f32>,
    pub entities: Vec<EntityBlueprint>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    /// Maximum run length in seconds (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Seed for reproducible deck shuffles
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    /// RON ability definitions; settings decide when absent
    #[serde(default)]
    pub abilities_path: Option<PathBuf>,
    /// RON state machine definitions; settings decide when absent
    #[serde(default)]
    pub ai_states_path: Option<PathBuf>,
    /// Where to write the JSON report
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// End the run once every player or every enemy is dead
    #[serde(default = "default_true")]
    pub stop_on_side_eliminated: bool,
    /// Start behaviour and depth markers of the run
    #[serde(default)]
    pub game: GameFlowConfig,
}

fn default_name() -> String {
    "scenario".to_string()
}

fn default_ground_height() -> Option<f32> {
    Some(0.0)
}

fn default_max_duration() -> f32 {
    DEFAULT_MAX_DURATION_SECS
}

fn default_tick_rate() -> f32 {
    DEFAULT_TICK_RATE_HZ
}

fn default_true() -> bool {
    true
}

impl ScenarioConfig {
    /// A scenario with the given entities and default everything else.
    pub fn new(name: impl Into<String>, entities: Vec<EntityBlueprint>) -> Self {
        Self {
            name: name.into(),
            ground_height: default_ground_height(),
            entities,
            obstacles: Vec::new(),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            random_seed: None,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            abilities_path: None,
            ai_states_path: None,
            output_path: None,
            stop_on_side_eliminated: true,
            game: GameFlowConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("Failed to read scenario file: {}", e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.entities.is_empty() {
            return Err("scenario must spawn at least one entity".to_string());
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if entity.name.is_empty() {
                return Err("entity names must not be empty".to_string());
            }
            if !seen.insert(entity.name.as_str()) {
                return Err(format!("duplicate entity name '{}'", entity.name));
            }
            if entity.status.max_health <= 0.0 {
                return Err(format!("entity '{}' must have positive max_health", entity.name));
            }
        }

        if !(self.max_duration_secs > 0.0) {
            return Err("max_duration_secs must be positive".to_string());
        }
        if !(self.tick_rate_hz > 0.0) {
            return Err("tick_rate_hz must be positive".to_string());
        }

        for obstacle in &self.obstacles {
            if obstacle.half_extents.min_element() <= 0.0 {
                return Err(format!("obstacle at {} has non-positive half extents", obstacle.center));
            }
        }

        if self.game.depth_markers.iter().any(|marker| !(*marker > 0.0)) {
            return Err("depth markers must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_fills_defaults() {
        let config = ScenarioConfig::from_json_str(
            r#"{ "entities": [ { "name": "hero", "kind": "Player", "position": [0.0, 0.0, 0.0] } ] }"#,
        )
        .expect("valid scenario");

        assert_eq!(config.ground_height, Some(0.0));
        assert_eq!(config.max_duration_secs, DEFAULT_MAX_DURATION_SECS);
        assert!(config.stop_on_side_eliminated);
        assert!(config.game.auto_start);
        assert_eq!(config.entities[0].status.max_health, 100.0);
    }

    #[test]
    fn test_game_and_obstacle_options_parse() {
        let config = ScenarioConfig::from_json_str(
            r#"{
                "entities": [ { "name": "hero", "kind": "Player", "position": [0.0, 0.0, 0.0] } ],
                "obstacles": [ { "center": [0.0, 1.0, -5.0], "half_extents": [2.0, 1.0, 0.5], "stop_mask": 2 } ],
                "game": { "auto_start": false, "depth_markers": [10.0, 25.0] }
            }"#,
        )
        .expect("valid scenario");

        assert!(!config.game.auto_start);
        assert_eq!(config.game.depth_markers, vec![10.0, 25.0]);
        assert_eq!(config.obstacles[0].stop_mask, Some(LayerMask::PLAYER));
    }

    #[test]
    fn test_non_positive_depth_marker_rejected() {
        let err = ScenarioConfig::from_json_str(
            r#"{
                "entities": [ { "name": "hero", "kind": "Player", "position": [0.0, 0.0, 0.0] } ],
                "game": { "depth_markers": [0.0] }
            }"#,
        )
        .unwrap_err();
        assert!(err.contains("depth markers"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = ScenarioConfig::from_json_str(
            r#"{ "entities": [
                { "name": "a", "kind": "Enemy", "position": [0.0, 0.0, 0.0] },
                { "name": "a", "kind": "Enemy", "position": [1.0, 0.0, 0.0] }
            ] }"#,
        )
        .unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_empty_scenario_rejected() {
        assert!(ScenarioConfig::from_json_str(r#"{ "entities": [] }"#).is_err());
    }
}
