//! Navigation / Pathing
//!
//! Resolves a target point for the current pathing mode, asks a [`PathQuery`]
//! for corner points, and turns the first path segment into a NAVIGATION
//! movement request. Paths are recalculated every `frequency` ticks and only
//! replaced when the corners actually changed.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::clock::SimClock;
use super::components::SimEntity;
use super::constants::{HOME_PROBE_DISTANCE, MAX_PATHING_FREQUENCY, MIN_PATHING_FREQUENCY, WAYPOINT_REACH_DISTANCE};
use super::detection::{DetectionInfo, DetectionState};
use super::movement::{MovementInfo, MovementSource};
use super::physics::{LayerMask, PhysicsQueries, PhysicsWorld};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathingMode {
    #[default]
    None,
    /// Follow the nearest detected entity
    Chase,
    /// Go back to the home point
    Return,
    /// Cycle through the patrol waypoints
    Patrol,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingConfig {
    /// Targets closer than this are treated as reached
    pub min_path_distance: f32,
    /// Paths longer than this are rejected as invalid
    pub max_path_distance: f32,
    /// Ticks between path recalculations (1-100)
    pub frequency: u32,
    pub chase_speed: f32,
    pub patrol_speed: f32,
    pub return_speed: f32,
    /// Waypoints relative to the spawn transform
    pub patrol_points: Vec<Vec3>,
}

impl Default for PathingConfig {
    fn default() -> Self {
        Self {
            min_path_distance: 0.5,
            max_path_distance: 50.0,
            frequency: 10,
            chase_speed: 4.0,
            patrol_speed: 2.0,
            return_speed: 3.0,
            patrol_points: Vec::new(),
        }
    }
}

impl PathingConfig {
    pub fn speed_for(&self, mode: PathingMode) -> f32 {
        match mode {
            PathingMode::Chase => self.chase_speed,
            PathingMode::Patrol => self.patrol_speed,
            PathingMode::Return => self.return_speed,
            PathingMode::None => 0.0,
        }
    }
}

/// One corner of the adopted path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathingPoint {
    pub point: Vec3,
    /// Unit direction to the next corner (zero for the last one)
    pub direction: Vec3,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathStatus {
    #[default]
    Complete,
    Partial,
    Invalid,
}

/// Corners returned by a path query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavPath {
    pub corners: Vec<Vec3>,
    pub status: PathStatus,
}

impl NavPath {
    pub fn invalid() -> Self {
        Self {
            corners: Vec::new(),
            status: PathStatus::Invalid,
        }
    }
}

/// Path planning backend (a navmesh in a full game).
pub trait PathQuery: Send + Sync {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath;
}

/// Walks straight at the target. Used when no navmesh is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct StraightLinePathfinder {
    pub max_distance: Option<f32>,
}

impl PathQuery for StraightLinePathfinder {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        if self.max_distance.is_some_and(|max| from.distance(to) > max) {
            return NavPath::invalid();
        }
        NavPath {
            corners: vec![from, to],
            status: PathStatus::Complete,
        }
    }
}

/// The path backend shared by all entities.
#[derive(Resource)]
pub struct Pathfinder(pub Box<dyn PathQuery>);

impl Default for Pathfinder {
    fn default() -> Self {
        Self(Box::new(StraightLinePathfinder::default()))
    }
}

#[derive(Component, Clone, Debug)]
pub struct NavigationState {
    pub config: PathingConfig,
    mode: PathingMode,
    can_pathfind: bool,
    movement: MovementInfo,
    points: Vec<PathingPoint>,
    path_status: PathStatus,
    home_point: Option<Vec3>,
    patrol_points: Vec<Vec3>,
    patrol_index: usize,
    chase_start: Option<Vec3>,
    initialized: bool,
}

impl NavigationState {
    pub fn new(config: PathingConfig) -> Self {
        Self {
            config,
            mode: PathingMode::None,
            can_pathfind: false,
            movement: MovementInfo::NONE,
            points: Vec::new(),
            path_status: PathStatus::Complete,
            home_point: None,
            patrol_points: Vec::new(),
            patrol_index: 0,
            chase_start: None,
            initialized: false,
        }
    }

    /// Capture the home point with a downward ground probe and move patrol
    /// waypoints into world space.
    pub fn initialize(&mut self, transform: &Transform, physics: &dyn PhysicsQueries) {
        let position = transform.translation;
        self.home_point = Some(
            physics
                .raycast(position + Vec3::Y * 0.1, Vec3::NEG_Y, HOME_PROBE_DISTANCE, LayerMask::TERRAIN)
                .map(|hit| hit.point)
                .unwrap_or(position),
        );
        self.patrol_points = self
            .config
            .patrol_points
            .iter()
            .map(|p| transform.transform_point(*p))
            .collect();
        self.patrol_index = 0;
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Per-tick update. Recalculates on frequency ticks, then emits movement
    /// along the first path segment while pathfinding is enabled.
    pub fn navigate(&mut self, tick: u64, position: Vec3, detection: &DetectionInfo, pathfinder: &dyn PathQuery) {
        self.movement = MovementInfo::NONE;

        let frequency = self.config.frequency.clamp(MIN_PATHING_FREQUENCY, MAX_PATHING_FREQUENCY);
        if tick % u64::from(frequency) == 0 {
            self.calculate_pathing(position, detection, pathfinder);
        }

        if self.can_pathfind {
            self.movement = self.path_movement();
        }
    }

    pub fn calculate_pathing(&mut self, position: Vec3, detection: &DetectionInfo, pathfinder: &dyn PathQuery) {
        let Some(target) = self.target_point(position, detection) else {
            return;
        };

        if position.distance(target) <= self.config.min_path_distance {
            self.points.clear();
            self.path_status = PathStatus::Complete;
            return;
        }

        let path = pathfinder.calculate_path(position, target);
        if path.status == PathStatus::Invalid || path_length(&path.corners) > self.config.max_path_distance {
            debug!("No valid path from {:?} to {:?}", position, target);
            self.path_status = PathStatus::Invalid;
            self.points.clear();
            return;
        }
        self.path_status = path.status;

        let points = pathing_points(&height_adjusted(&path.corners, position.y));
        if points != self.points {
            self.points = points;
        }
    }

    fn target_point(&mut self, position: Vec3, detection: &DetectionInfo) -> Option<Vec3> {
        match self.mode {
            PathingMode::Chase => detection.closest_entity(0.0, 0.0).map(|d| d.position),
            PathingMode::Patrol => self.next_patrol_point(position),
            PathingMode::Return => self.home_point,
            PathingMode::None => None,
        }
    }

    /// Current waypoint, advancing cyclically once the entity is close to it.
    fn next_patrol_point(&mut self, position: Vec3) -> Option<Vec3> {
        let current = *self.patrol_points.get(self.patrol_index)?;
        let flat = Vec3::new(current.x, position.y, current.z);
        if flat.distance(position) <= WAYPOINT_REACH_DISTANCE {
            self.patrol_index = (self.patrol_index + 1) % self.patrol_points.len();
        }
        self.patrol_points.get(self.patrol_index).copied()
    }

    fn path_movement(&self) -> MovementInfo {
        let (Some(from), Some(to)) = (self.points.first(), self.points.get(1)) else {
            return MovementInfo::NONE;
        };
        let direction = (to.point - from.point).normalize_or_zero();
        if direction == Vec3::ZERO {
            return MovementInfo::NONE;
        }
        MovementInfo::new(
            MovementSource::Navigation,
            direction * self.config.speed_for(self.mode),
            true,
        )
    }

    /// Enable or disable path following. Disabling stops movement immediately.
    pub fn toggle_pathfinding(&mut self, enabled: bool) {
        self.can_pathfind = enabled;
        if !enabled {
            self.movement = MovementInfo::NONE;
        }
    }

    pub fn set_mode(&mut self, mode: PathingMode, position: Vec3) {
        if mode == PathingMode::Chase {
            self.chase_start = Some(position);
        }
        if mode != self.mode {
            self.points.clear();
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> PathingMode {
        self.mode
    }

    pub fn can_pathfind(&self) -> bool {
        self.can_pathfind
    }

    pub fn movement(&self) -> MovementInfo {
        self.movement
    }

    pub fn points(&self) -> &[PathingPoint] {
        &self.points
    }

    pub fn home_point(&self) -> Option<Vec3> {
        self.home_point
    }

    pub fn chase_start(&self) -> Option<Vec3> {
        self.chase_start
    }

    pub fn has_patrol_points(&self) -> bool {
        !self.patrol_points.is_empty()
    }

    pub fn is_path_valid(&self) -> bool {
        self.path_status != PathStatus::Invalid
    }

    pub fn total_path_distance(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].point.distance(w[1].point)).sum()
    }

    pub fn reached(position: Vec3, target: Vec3, distance: f32) -> bool {
        position.distance(target) <= distance
    }
}

fn path_length(corners: &[Vec3]) -> f32 {
    corners.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Flatten corners to the entity's elevation.
fn height_adjusted(corners: &[Vec3], height: f32) -> Vec<Vec3> {
    corners.iter().map(|c| Vec3::new(c.x, height, c.z)).collect()
}

fn pathing_points(corners: &[Vec3]) -> Vec<PathingPoint> {
    corners
        .iter()
        .enumerate()
        .map(|(index, point)| PathingPoint {
            point: *point,
            direction: corners
                .get(index + 1)
                .map(|next| (*next - *point).normalize_or_zero())
                .unwrap_or(Vec3::ZERO),
            index,
        })
        .collect()
}

/// Capture home points and world-space patrol routes for newly spawned entities.
pub fn initialize_navigation(
    physics: Res<PhysicsWorld>,
    mut query: Query<(&Transform, &mut NavigationState), Added<NavigationState>>,
) {
    for (transform, mut navigation) in query.iter_mut() {
        if !navigation.is_initialized() {
            navigation.initialize(transform, &*physics);
        }
    }
}

/// Run path following for every entity.
pub fn navigate_entities(
    clock: Res<SimClock>,
    pathfinder: Res<Pathfinder>,
    mut query: Query<(&SimEntity, &Transform, &DetectionState, &mut NavigationState)>,
) {
    for (entity, transform, detection, mut navigation) in query.iter_mut() {
        if !entity.capture.navigation {
            continue;
        }
        navigation.navigate(clock.tick, transform.translation, detection.info(), pathfinder.0.as_ref());
    }
}
