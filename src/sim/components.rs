//! Shared Component Definitions
//!
//! Identity and controller components every simulated entity carries, plus the
//! simulation-wide resources that are not owned by a single subsystem.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// What kind of actor an entity is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[default]
    None,
    Player,
    Enemy,
}

/// Per-subsystem switches for one entity. A disabled subsystem is skipped
/// for that entity every tick, leaving its state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureToggles {
    pub states: bool,
    pub abilities: bool,
    pub navigation: bool,
    pub movement: bool,
    pub detection: bool,
    pub status: bool,
}

impl Default for CaptureToggles {
    fn default() -> Self {
        Self {
            states: true,
            abilities: true,
            navigation: true,
            movement: true,
            detection: true,
            status: true,
        }
    }
}

/// Identity and controller switches of a simulated entity.
#[derive(Component, Clone, Debug)]
pub struct SimEntity {
    pub name: String,
    pub kind: EntityKind,
    pub capture: CaptureToggles,
}

impl SimEntity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            capture: CaptureToggles::default(),
        }
    }
}

/// Shared random source. Deck shuffles draw from it, so a seeded run
/// replays identically.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    seed: Option<u64>,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Unseeded; every run differs.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Borrow the underlying generator for APIs generic over [`rand::Rng`].
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Scales how far the clock advances per update. Zero freezes the simulation.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimulationSpeed {
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn resume(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier <= 0.0
    }
}
