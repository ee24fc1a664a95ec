//! Decision and action strategies, dispatched by variant.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::sim::abilities::AbilityStateInfo;
use crate::sim::constants::{DEFAULT_ATTACK_RANGE, DEFAULT_HOME_TOLERANCE};
use crate::sim::detection::DetectionInfo;
use crate::sim::input::InputButton;
use crate::sim::navigation::{NavigationState, PathingMode};
use crate::sim::status::StatusInfo;

fn default_attack_range() -> f32 {
    DEFAULT_ATTACK_RANGE
}

fn default_home_tolerance() -> f32 {
    DEFAULT_HOME_TOLERANCE
}

/// Everything a strategy may read or drive for one entity on one tick.
pub struct AiContext<'a> {
    pub position: Vec3,
    pub status: StatusInfo,
    pub abilities: &'a AbilityStateInfo,
    pub detection: &'a DetectionInfo,
    pub navigation: &'a mut NavigationState,
    /// Buttons the AI holds this tick
    pub buttons: SmallVec<[InputButton; 2]>,
}

impl AiContext<'_> {
    pub fn hold(&mut self, button: InputButton) {
        if !self.buttons.contains(&button) {
            self.buttons.push(button);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Health has reached zero
    CheckForDeath,
    /// Anything is detected
    DetectEnemy,
    /// The closest detected entity is within range
    InAttackRange {
        #[serde(default = "default_attack_range")]
        min_attack_range: f32,
    },
    /// Standing on the navigation home point
    CheckForHomePoint {
        #[serde(default = "default_home_tolerance")]
        min_distance: f32,
    },
    /// The current navigation path is usable
    NavigationPathValid,
}

impl DecisionKind {
    pub fn decide(&self, ctx: &AiContext) -> bool {
        match *self {
            DecisionKind::CheckForDeath => ctx.status.health <= 0.0,
            DecisionKind::DetectEnemy => ctx.detection.has_detections(),
            DecisionKind::InAttackRange { min_attack_range } => {
                ctx.detection.has_detections() && ctx.detection.closest_distance <= min_attack_range
            }
            DecisionKind::CheckForHomePoint { min_distance } => ctx
                .navigation
                .home_point()
                .is_some_and(|home| NavigationState::reached(ctx.position, home, min_distance)),
            DecisionKind::NavigationPathValid => ctx.navigation.is_path_valid(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Stop pathing
    Idle,
    /// Path toward the closest detected entity
    Chase,
    /// Walk the patrol loop
    Patrol,
    /// Path back to the home point
    ReturnHome,
    /// Stop everything
    Death,
    /// Hold the action button for an ability slot
    Attack { slot: usize },
}

impl ActionKind {
    /// Runs once when the owning state is entered.
    pub fn initialize(&self, ctx: &mut AiContext) {
        match *self {
            ActionKind::Idle | ActionKind::Death => {
                ctx.navigation.toggle_pathfinding(false);
                ctx.navigation.set_mode(PathingMode::None, ctx.position);
            }
            ActionKind::Chase => {
                if ctx.detection.has_detections() {
                    ctx.navigation.set_mode(PathingMode::Chase, ctx.position);
                    ctx.navigation.toggle_pathfinding(true);
                }
            }
            ActionKind::Patrol => {
                if ctx.navigation.has_patrol_points() {
                    ctx.navigation.set_mode(PathingMode::Patrol, ctx.position);
                    ctx.navigation.toggle_pathfinding(true);
                }
            }
            ActionKind::ReturnHome => {
                ctx.navigation.set_mode(PathingMode::Return, ctx.position);
                ctx.navigation.toggle_pathfinding(true);
            }
            ActionKind::Attack { .. } => {}
        }
    }

    /// Runs every tick while the owning state is current.
    pub fn act(&self, ctx: &mut AiContext) {
        if let ActionKind::Attack { slot } = *self {
            match InputButton::action(slot) {
                Some(button) => ctx.hold(button),
                None => warn!("Attack action uses slot {} which has no button", slot),
            }
        }
    }
}
