//! Detection Service
//!
//! Proximity sensing with line-of-sight classification. Each refresh keeps the
//! previous scan so callers can diff what appeared and what went away.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::SimEntity;
use super::physics::{LayerMask, PhysicsQueries, PhysicsWorld};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub radius: f32,
    /// Layers that can be detected
    pub detection_mask: LayerMask,
    /// Layers that block line of sight
    pub terrain_mask: LayerMask,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            detection_mask: LayerMask::PLAYER,
            terrain_mask: LayerMask::TERRAIN,
        }
    }
}

/// One entity found by a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedEntity {
    pub entity: Entity,
    pub position: Vec3,
    pub in_line_of_sight: bool,
}

/// Snapshot of one scan plus the scan before it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionInfo {
    pub detected: Vec<DetectedEntity>,
    pub previous: Vec<DetectedEntity>,
    pub detector_position: Vec3,
    /// Distance to the nearest detected entity (0 when none)
    pub closest_distance: f32,
    /// Distance to the farthest detected entity (0 when none)
    pub furthest_distance: f32,
}

impl DetectionInfo {
    pub fn new(detected: Vec<DetectedEntity>, previous: Vec<DetectedEntity>, detector_position: Vec3) -> Self {
        let mut info = Self {
            detected,
            previous,
            detector_position,
            closest_distance: 0.0,
            furthest_distance: 0.0,
        };
        info.closest_distance = info.closest_distance_within(0.0, 0.0);
        info.furthest_distance = info.furthest_distance_within(0.0, 0.0);
        info
    }

    pub fn has_detections(&self) -> bool {
        !self.detected.is_empty()
    }

    /// Detected entities with distance in `[min, max]`. A bound of 0 is ignored.
    fn in_range(&self, min: f32, max: f32) -> impl Iterator<Item = (&DetectedEntity, f32)> {
        self.detected
            .iter()
            .map(move |d| (d, d.position.distance(self.detector_position)))
            .filter(move |(_, dist)| (min <= 0.0 || *dist >= min) && (max <= 0.0 || *dist <= max))
    }

    pub fn closest_entity(&self, min: f32, max: f32) -> Option<&DetectedEntity> {
        self.in_range(min, max)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(d, _)| d)
    }

    pub fn furthest_entity(&self, min: f32, max: f32) -> Option<&DetectedEntity> {
        self.in_range(min, max)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(d, _)| d)
    }

    /// Distance to the nearest entity in range, or 0 when there is none.
    pub fn closest_distance_within(&self, min: f32, max: f32) -> f32 {
        self.in_range(min, max).map(|(_, d)| d).reduce(f32::min).unwrap_or(0.0)
    }

    /// Distance to the farthest entity in range, or 0 when there is none.
    pub fn furthest_distance_within(&self, min: f32, max: f32) -> f32 {
        self.in_range(min, max).map(|(_, d)| d).reduce(f32::max).unwrap_or(0.0)
    }

    /// Entities in this scan that were not in the previous one.
    pub fn newly_detected(&self) -> Vec<Entity> {
        self.detected
            .iter()
            .filter(|d| !self.previous.iter().any(|p| p.entity == d.entity))
            .map(|d| d.entity)
            .collect()
    }

    /// Entities from the previous scan that are gone now.
    pub fn newly_lost(&self) -> Vec<Entity> {
        self.previous
            .iter()
            .filter(|p| !self.detected.iter().any(|d| d.entity == p.entity))
            .map(|p| p.entity)
            .collect()
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct DetectionState {
    pub config: DetectionConfig,
    info: DetectionInfo,
}

impl DetectionState {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            info: DetectionInfo::default(),
        }
    }

    pub fn info(&self) -> &DetectionInfo {
        &self.info
    }

    /// Scan around `position`, never reporting `detector` itself.
    pub fn refresh(&mut self, detector: Entity, position: Vec3, physics: &dyn PhysicsQueries) -> &DetectionInfo {
        let detected = physics
            .overlap_sphere(position, self.config.radius, self.config.detection_mask)
            .into_iter()
            .filter(|e| *e != detector)
            .filter_map(|entity| {
                let target = physics.position_of(entity)?;
                Some(DetectedEntity {
                    entity,
                    position: target,
                    in_line_of_sight: self.has_line_of_sight(position, target, physics),
                })
            })
            .collect();

        let previous = std::mem::take(&mut self.info.detected);
        self.info = DetectionInfo::new(detected, previous, position);
        &self.info
    }

    /// Terrain within half the detection radius toward the target blocks sight.
    fn has_line_of_sight(&self, from: Vec3, to: Vec3, physics: &dyn PhysicsQueries) -> bool {
        physics
            .raycast(from, to - from, self.config.radius * 0.5, self.config.terrain_mask)
            .is_none()
    }
}

/// Refresh every entity's detection snapshot for the next tick.
pub fn refresh_detection(
    physics: Res<PhysicsWorld>,
    mut query: Query<(Entity, &SimEntity, &Transform, &mut DetectionState)>,
) {
    for (entity, sim_entity, transform, mut detection) in query.iter_mut() {
        if sim_entity.capture.detection {
            detection.refresh(entity, transform.translation, &*physics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::{Collider, ColliderShape};

    fn body(world: &mut PhysicsWorld, index: u32, position: Vec3, layer: LayerMask) -> Entity {
        let entity = Entity::from_raw(index);
        let shape = if layer == LayerMask::TERRAIN {
            ColliderShape::Box { half_extents: Vec3::splat(0.5) }
        } else {
            ColliderShape::Sphere { radius: 0.5 }
        };
        world.insert(entity, &Transform::from_translation(position), &Collider { shape, layer });
        entity
    }

    #[test]
    fn test_refresh_excludes_self_and_tracks_previous() {
        let mut world = PhysicsWorld::default();
        let me = body(&mut world, 1, Vec3::ZERO, LayerMask::PLAYER);
        let near = body(&mut world, 2, Vec3::new(3.0, 0.0, 0.0), LayerMask::PLAYER);
        let far = body(&mut world, 3, Vec3::new(6.0, 0.0, 0.0), LayerMask::PLAYER);

        let mut detection = DetectionState::new(DetectionConfig::default());
        let info = detection.refresh(me, Vec3::ZERO, &world).clone();
        assert_eq!(info.detected.len(), 2);
        assert!((info.closest_distance - 3.0).abs() < 1e-5);
        assert!((info.furthest_distance - 6.0).abs() < 1e-5);
        assert_eq!(info.closest_entity(0.0, 0.0).map(|d| d.entity), Some(near));
        assert_eq!(info.furthest_entity(0.0, 5.0).map(|d| d.entity), Some(near));
        assert_eq!(info.closest_entity(4.0, 0.0).map(|d| d.entity), Some(far));
        assert_eq!(info.newly_detected().len(), 2);

        let mut world = PhysicsWorld::default();
        body(&mut world, 1, Vec3::ZERO, LayerMask::PLAYER);
        body(&mut world, 2, Vec3::new(3.0, 0.0, 0.0), LayerMask::PLAYER);
        let info = detection.refresh(me, Vec3::ZERO, &world);
        assert_eq!(info.previous.len(), 2);
        assert_eq!(info.newly_lost(), vec![far]);
        assert!(info.newly_detected().is_empty());
    }

    #[test]
    fn test_empty_scan_reports_zero_distances() {
        let world = PhysicsWorld::default();
        let mut detection = DetectionState::new(DetectionConfig::default());
        let info = detection.refresh(Entity::from_raw(1), Vec3::ZERO, &world);
        assert_eq!(info.closest_distance, 0.0);
        assert_eq!(info.furthest_distance, 0.0);
        assert!(info.closest_entity(0.0, 0.0).is_none());
    }

    #[test]
    fn test_terrain_blocks_line_of_sight() {
        let mut world = PhysicsWorld::default();
        body(&mut world, 2, Vec3::new(4.0, 0.0, 0.0), LayerMask::PLAYER);
        body(&mut world, 3, Vec3::new(2.0, 0.0, 0.0), LayerMask::TERRAIN);
        body(&mut world, 4, Vec3::new(-4.0, 0.0, 0.0), LayerMask::PLAYER);

        let mut detection = DetectionState::new(DetectionConfig::default());
        let info = detection.refresh(Entity::from_raw(1), Vec3::ZERO, &world);
        let blocked = info.detected.iter().find(|d| d.entity == Entity::from_raw(2)).unwrap();
        let clear = info.detected.iter().find(|d| d.entity == Entity::from_raw(4)).unwrap();
        assert!(!blocked.in_line_of_sight);
        assert!(clear.in_line_of_sight);
    }
}
