//! Simulation settings
//!
//! Seed, log level and config file locations, stored as RON. Missing or
//! broken settings files fall back to defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by every run of the simulation
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Seed for scenarios that do not name their own
    pub random_seed: Option<u64>,
    pub abilities_path: PathBuf,
    pub ai_states_path: PathBuf,
    /// Console log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            random_seed: None,
            abilities_path: PathBuf::from("assets/config/abilities.ron"),
            ai_states_path: PathBuf::from("assets/config/ai_states.ron"),
            log_level: "info".to_string(),
        }
    }
}

impl SimulationSettings {
    /// Load settings from file, or return default if file doesn't exist
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<SimulationSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(path, contents).map_err(|e| format!("Failed to write {:?}: {}", path, e))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = SimulationSettings::load(Path::new("does/not/exist/settings.ron"));
        assert_eq!(settings, SimulationSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.ron");
        fs::write(&path, "(random_seed: Some(9), log_level: \"debug\")").expect("write");

        let settings = SimulationSettings::load(&path);
        assert_eq!(settings.random_seed, Some(9));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.abilities_path, PathBuf::from("assets/config/abilities.ron"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.ron");
        let settings = SimulationSettings {
            random_seed: Some(3),
            ..Default::default()
        };
        settings.save(&path).expect("save");
        assert_eq!(SimulationSettings::load(&path), settings);
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.ron");
        fs::write(&path, "not ron at all {").expect("write");
        assert_eq!(SimulationSettings::load(&path), SimulationSettings::default());
    }
}
