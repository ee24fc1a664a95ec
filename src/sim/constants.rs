//! Simulation Constants
//!
//! Centralized location for magic numbers used throughout the entity simulation.
//! Per-entity tunables live in the config structs; these are the shared defaults.

// ============================================================================
// Timing
// ============================================================================

/// Default simulation tick rate in ticks per second.
pub const DEFAULT_TICK_RATE_HZ: f32 = 60.0;

/// Default maximum scenario length in seconds before the runner stops.
pub const DEFAULT_MAX_DURATION_SECS: f32 = 120.0;

// ============================================================================
// Movement
// ============================================================================

/// Downward acceleration applied to airborne entities (units/s²).
pub const DEFAULT_GRAVITY: f32 = -9.81;

/// Distance above the ground plane that still counts as grounded.
pub const GROUND_SKIN: f32 = 0.05;

/// Navigation never asks the motion resolver for less than this target speed.
pub const MIN_NAVIGATION_SPEED: f32 = 1.0;

// ============================================================================
// Navigation
// ============================================================================

/// A patrol waypoint counts as reached within this distance.
pub const WAYPOINT_REACH_DISTANCE: f32 = 1.0;

/// Length of the downward ray used to find the home point.
pub const HOME_PROBE_DISTANCE: f32 = 100.0;

/// Path recalculation frequency bounds (ticks between recalculations).
pub const MIN_PATHING_FREQUENCY: u32 = 1;
pub const MAX_PATHING_FREQUENCY: u32 = 100;

// ============================================================================
// AI
// ============================================================================

/// Default reach for the in-attack-range decision.
pub const DEFAULT_ATTACK_RANGE: f32 = 3.0;

/// Default tolerance for the home-point decision.
pub const DEFAULT_HOME_TOLERANCE: f32 = 0.5;

// ============================================================================
// Abilities
// ============================================================================

/// Number of ability logic slots an entity gets unless configured otherwise.
pub const DEFAULT_ABILITY_SLOTS: usize = 3;

/// Default player hand size.
pub const DEFAULT_HAND_SIZE: usize = 3;
