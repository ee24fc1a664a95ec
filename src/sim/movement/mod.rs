//! Movement requests and the per-entity motion resolver.
//!
//! Every tick exactly one source is allowed to drive an entity. Status effects
//! win over abilities, abilities over navigation, and raw input is the
//! fallback. A separate [`MovementModifier`] (slows, stuns) scales whatever
//! source ends up in charge.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::DEFAULT_GRAVITY;

pub mod resolver;

pub use resolver::{resolve_movement, MovementState};

/// Who is requesting movement this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementSource {
    #[default]
    None,
    Input,
    Action,
    Navigation,
    Status,
}

/// Coordinate space of a movement vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementSpace {
    #[default]
    World,
    /// Relative to the entity's own orientation
    Local,
}

/// A movement request from one source, rebuilt every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementInfo {
    pub source: MovementSource,
    pub movement: Vec3,
    /// Weight of the raw input nudge blended into action/status movement
    pub input_modifier: f32,
    pub space: MovementSpace,
    pub use_gravity: bool,
    /// Move along the ground forward vector instead of `movement`'s direction
    pub use_forward: bool,
}

impl MovementInfo {
    pub const NONE: MovementInfo = MovementInfo {
        source: MovementSource::None,
        movement: Vec3::ZERO,
        input_modifier: 0.0,
        space: MovementSpace::World,
        use_gravity: false,
        use_forward: false,
    };

    pub fn new(source: MovementSource, movement: Vec3, use_gravity: bool) -> Self {
        Self {
            source,
            movement,
            use_gravity,
            ..Self::NONE
        }
    }

    /// Raw input fallback used when no other source claims the entity.
    pub fn input(raw: Vec3) -> Self {
        Self::new(MovementSource::Input, raw, true)
    }

    pub fn is_none(&self) -> bool {
        self.source == MovementSource::None
    }
}

/// Multiplier applied on top of the chosen movement source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementModifier {
    pub source: MovementSource,
    pub force: Vec3,
    /// 0 freezes the entity, 1 leaves it unchanged
    pub effectiveness: f32,
}

impl MovementModifier {
    pub const NONE: MovementModifier = MovementModifier {
        source: MovementSource::None,
        force: Vec3::ZERO,
        effectiveness: 1.0,
    };

    pub fn is_none(&self) -> bool {
        self.source == MovementSource::None
    }
}

impl Default for MovementModifier {
    fn default() -> Self {
        Self::NONE
    }
}

/// Pick the authoritative movement request for this tick.
///
/// Status overrides beat ability movement, which beats navigation. `None`
/// means the caller should fall back to raw input.
pub fn select_movement_override(
    status: MovementInfo,
    ability: MovementInfo,
    navigation: MovementInfo,
) -> Option<MovementInfo> {
    [status, ability, navigation].into_iter().find(|info| !info.is_none())
}

/// Movement tuning for one entity.
#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Top speed at full input (units/s)
    pub base_speed: f32,
    pub grounded_smoothing: f32,
    pub airborne_smoothing: f32,
    pub grounded_rotation_smoothing: f32,
    pub airborne_rotation_smoothing: f32,
    /// Steepest slope (degrees) the entity can stand on
    pub max_walkable_slope_angle: f32,
    /// Slope angle (degrees) at which sliding speed doubles
    pub max_slope_slide_angle: f32,
    /// Seconds spent on an unwalkable slope before sliding starts
    pub slip_time: f32,
    pub slide_speed: f32,
    pub slide_smoothing: f32,
    /// Vertical acceleration while airborne (negative is down)
    pub gravity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            grounded_smoothing: 0.1,
            airborne_smoothing: 0.3,
            grounded_rotation_smoothing: 0.08,
            airborne_rotation_smoothing: 0.2,
            max_walkable_slope_angle: 45.0,
            max_slope_slide_angle: 80.0,
            slip_time: 0.25,
            slide_speed: 4.0,
            slide_smoothing: 0.2,
            gravity: DEFAULT_GRAVITY,
        }
    }
}
