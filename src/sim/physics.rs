//! Collision snapshot and spatial queries.
//!
//! The simulation only needs a handful of queries from a physics engine:
//! shape overlaps against a layer mask, ray casts, and where a hit entity is.
//! [`PhysicsQueries`] is that seam. [`PhysicsWorld`] is the built-in
//! implementation, rebuilt from [`Collider`] components at the start of each
//! tick so every system reads the same snapshot.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::constants::GROUND_SKIN;
use super::math::slope_angle_degrees;

/// Bit set of collision layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const TERRAIN: LayerMask = LayerMask(1);
    pub const PLAYER: LayerMask = LayerMask(1 << 1);
    pub const ENEMY: LayerMask = LayerMask(1 << 2);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// True when the two masks share at least one layer.
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }
}

/// Collision shape of a body or query volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Sphere { radius: f32 },
    /// Oriented box given by its half extents
    Box { half_extents: Vec3 },
}

impl ColliderShape {
    /// Radius of a sphere enclosing the shape.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            ColliderShape::Sphere { radius } => radius,
            ColliderShape::Box { half_extents } => half_extents.length(),
        }
    }
}

/// Makes an entity visible to physics queries.
#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub shape: ColliderShape,
    pub layer: LayerMask,
}

/// Result of a ray cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Entity hit, or `None` for the ground plane
    pub entity: Option<Entity>,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Hits returned by overlap queries.
pub type OverlapHits = SmallVec<[Entity; 8]>;

/// Spatial queries the simulation consumes from a physics backend.
pub trait PhysicsQueries {
    /// Entities on `mask` whose colliders intersect the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> OverlapHits;

    /// Entities on `mask` whose colliders intersect the oriented box.
    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat, mask: LayerMask) -> OverlapHits;

    /// Closest hit along the ray within `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// Snapshot position of a body.
    fn position_of(&self, entity: Entity) -> Option<Vec3>;
}

#[derive(Clone, Copy, Debug)]
struct PhysicsBody {
    entity: Entity,
    position: Vec3,
    rotation: Quat,
    shape: ColliderShape,
    layer: LayerMask,
}

/// Built-in physics snapshot: collider bodies plus an optional flat ground plane.
///
/// The ground plane belongs to [`LayerMask::TERRAIN`].
#[derive(Resource, Debug, Default)]
pub struct PhysicsWorld {
    bodies: Vec<PhysicsBody>,
    /// Height of the infinite ground plane, if there is one
    pub ground_height: Option<f32>,
}

impl PhysicsWorld {
    pub fn with_ground(height: f32) -> Self {
        Self {
            bodies: Vec::new(),
            ground_height: Some(height),
        }
    }

    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
    }

    pub fn insert(&mut self, entity: Entity, transform: &Transform, collider: &Collider) {
        self.bodies.push(PhysicsBody {
            entity,
            position: transform.translation,
            rotation: transform.rotation,
            shape: collider.shape,
            layer: collider.layer,
        });
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn bodies_on(&self, mask: LayerMask) -> impl Iterator<Item = &PhysicsBody> {
        self.bodies.iter().filter(move |b| b.layer.intersects(mask))
    }
}

/// Closest point on an oriented box to `point`.
fn closest_point_on_box(point: Vec3, center: Vec3, rotation: Quat, half_extents: Vec3) -> Vec3 {
    let local = rotation.inverse() * (point - center);
    let clamped = local.clamp(-half_extents, half_extents);
    center + rotation * clamped
}

fn sphere_hits_body(center: Vec3, radius: f32, body: &PhysicsBody) -> bool {
    match body.shape {
        ColliderShape::Sphere { radius: r } => center.distance(body.position) <= radius + r,
        ColliderShape::Box { half_extents } => {
            let closest = closest_point_on_box(center, body.position, body.rotation, half_extents);
            closest.distance(center) <= radius
        }
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(dir);
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 || b > 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

fn ray_box(origin: Vec3, dir: Vec3, center: Vec3, rotation: Quat, half_extents: Vec3) -> Option<f32> {
    let inv = rotation.inverse();
    let o = inv * (origin - center);
    let d = inv * dir;

    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d, h) = (o[axis], d[axis], half_extents[axis]);
        if d.abs() < f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

impl PhysicsQueries for PhysicsWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> OverlapHits {
        self.bodies_on(mask)
            .filter(|b| sphere_hits_body(center, radius, b))
            .map(|b| b.entity)
            .collect()
    }

    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat, mask: LayerMask) -> OverlapHits {
        // Box bodies are approximated by their bounding sphere against a box query
        self.bodies_on(mask)
            .filter(|b| {
                let closest = closest_point_on_box(b.position, center, rotation, half_extents);
                closest.distance(b.position) <= b.shape.bounding_radius()
            })
            .map(|b| b.entity)
            .collect()
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;

        for body in self.bodies_on(mask) {
            let t = match body.shape {
                ColliderShape::Sphere { radius } => ray_sphere(origin, dir, body.position, radius),
                ColliderShape::Box { half_extents } => {
                    ray_box(origin, dir, body.position, body.rotation, half_extents)
                }
            };
            let Some(t) = t.filter(|t| *t <= max_distance) else {
                continue;
            };
            if best.map_or(true, |hit| t < hit.distance) {
                let point = origin + dir * t;
                best = Some(RayHit {
                    entity: Some(body.entity),
                    point,
                    normal: (point - body.position).normalize_or_zero(),
                    distance: t,
                });
            }
        }

        if let Some(ground) = self.ground_height.filter(|_| mask.intersects(LayerMask::TERRAIN)) {
            if dir.y < 0.0 && origin.y >= ground {
                let t = (ground - origin.y) / dir.y;
                if t <= max_distance && best.map_or(true, |hit| t < hit.distance) {
                    best = Some(RayHit {
                        entity: None,
                        point: origin + dir * t,
                        normal: Vec3::Y,
                        distance: t,
                    });
                }
            }
        }

        best
    }

    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.bodies.iter().find(|b| b.entity == entity).map(|b| b.position)
    }
}

/// Ground contact as seen by the motion resolver.
#[derive(Component, Clone, Debug)]
pub struct CollisionState {
    pub is_grounded: bool,
    /// Standing on a surface that is not flat
    pub is_on_slope: bool,
    /// Average normal of the surfaces under the entity
    pub ground_normal: Vec3,
    /// Entity forward projected onto the ground
    pub ground_forward: Vec3,
    /// Angles (degrees) of every surface currently touched
    pub slope_angles: SmallVec<[f32; 4]>,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self {
            is_grounded: false,
            is_on_slope: false,
            ground_normal: Vec3::Y,
            ground_forward: Vec3::NEG_Z,
            slope_angles: SmallVec::new(),
        }
    }
}

impl CollisionState {
    /// Record contact with surfaces described by `normals`, seen from an entity facing `forward`.
    pub fn set_contacts(&mut self, normals: &[Vec3], forward: Vec3) {
        self.is_grounded = !normals.is_empty();
        self.slope_angles = normals.iter().map(|n| slope_angle_degrees(*n)).collect();
        self.is_on_slope = self.slope_angles.iter().any(|a| *a > f32::EPSILON);

        let sum: Vec3 = normals.iter().copied().sum();
        self.ground_normal = if sum == Vec3::ZERO { Vec3::Y } else { sum.normalize() };

        let flat = super::math::project_on_plane(forward, self.ground_normal).normalize_or_zero();
        self.ground_forward = if flat == Vec3::ZERO { forward } else { flat };
    }

    pub fn smallest_slope_angle(&self) -> f32 {
        self.slope_angles.iter().copied().fold(None, |min: Option<f32>, a| {
            Some(min.map_or(a, |m| m.min(a)))
        }).unwrap_or(0.0)
    }

    pub fn average_slope_angle(&self) -> f32 {
        if self.slope_angles.is_empty() {
            return 0.0;
        }
        self.slope_angles.iter().sum::<f32>() / self.slope_angles.len() as f32
    }
}

/// Rebuild the physics snapshot from the current collider transforms.
pub fn sync_physics_world(mut world: ResMut<PhysicsWorld>, bodies: Query<(Entity, &Transform, &Collider)>) {
    world.clear_bodies();
    for (entity, transform, collider) in bodies.iter() {
        world.insert(entity, transform, collider);
    }
}

/// Test every entity against the ground plane, snapping grounded entities onto it.
pub fn probe_ground(world: Res<PhysicsWorld>, mut query: Query<(&mut Transform, &mut CollisionState)>) {
    for (mut transform, mut collision) in query.iter_mut() {
        let forward = transform.rotation * Vec3::NEG_Z;
        match world.ground_height {
            Some(ground) if transform.translation.y <= ground + GROUND_SKIN => {
                transform.translation.y = ground;
                collision.set_contacts(&[Vec3::Y], forward);
            }
            _ => collision.set_contacts(&[], forward),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(bodies: &[(u32, Vec3, ColliderShape, LayerMask)]) -> PhysicsWorld {
        let mut world = PhysicsWorld::with_ground(0.0);
        for (index, position, shape, layer) in bodies {
            world.insert(
                Entity::from_raw(*index),
                &Transform::from_translation(*position),
                &Collider { shape: *shape, layer: *layer },
            );
        }
        world
    }

    #[test]
    fn test_overlap_sphere_respects_mask_and_distance() {
        let world = world_with(&[
            (1, Vec3::new(2.0, 0.0, 0.0), ColliderShape::Sphere { radius: 0.5 }, LayerMask::ENEMY),
            (2, Vec3::new(2.0, 0.0, 0.0), ColliderShape::Sphere { radius: 0.5 }, LayerMask::PLAYER),
            (3, Vec3::new(9.0, 0.0, 0.0), ColliderShape::Sphere { radius: 0.5 }, LayerMask::ENEMY),
        ]);

        let hits = world.overlap_sphere(Vec3::ZERO, 2.0, LayerMask::ENEMY);
        assert_eq!(hits.as_slice(), &[Entity::from_raw(1)]);
    }

    #[test]
    fn test_overlap_box_rotated() {
        let world = world_with(&[(
            1,
            Vec3::new(0.0, 0.0, -2.5),
            ColliderShape::Sphere { radius: 0.25 },
            LayerMask::ENEMY,
        )]);

        let long_forward = Vec3::new(0.5, 0.5, 3.0);
        let hits = world.overlap_box(Vec3::ZERO, long_forward, Quat::IDENTITY, LayerMask::ENEMY);
        assert_eq!(hits.len(), 1);

        // Same box turned sideways no longer reaches the body
        let sideways = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let hits = world.overlap_box(Vec3::ZERO, long_forward, sideways, LayerMask::ENEMY);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_raycast_hits_nearest() {
        let world = world_with(&[
            (1, Vec3::new(0.0, 1.0, -5.0), ColliderShape::Box { half_extents: Vec3::splat(1.0) }, LayerMask::TERRAIN),
            (2, Vec3::new(0.0, 1.0, -9.0), ColliderShape::Sphere { radius: 1.0 }, LayerMask::TERRAIN),
        ]);

        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 20.0, LayerMask::TERRAIN)
            .expect("ray should hit the box");
        assert_eq!(hit.entity, Some(Entity::from_raw(1)));
        assert!((hit.distance - 4.0).abs() < 1e-4);

        assert!(world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 3.0, LayerMask::TERRAIN)
            .is_none());
    }

    #[test]
    fn test_raycast_down_finds_ground_plane() {
        let world = PhysicsWorld::with_ground(-1.0);
        let hit = world
            .raycast(Vec3::new(3.0, 4.0, 0.0), Vec3::NEG_Y, 50.0, LayerMask::TERRAIN)
            .expect("ground plane");
        assert_eq!(hit.entity, None);
        assert!((hit.point - Vec3::new(3.0, -1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_collision_contacts_on_slope() {
        let mut collision = CollisionState::default();
        let tilted = Vec3::new(0.0, 1.0, 1.0).normalize();
        collision.set_contacts(&[tilted], Vec3::NEG_Z);

        assert!(collision.is_grounded);
        assert!(collision.is_on_slope);
        assert!((collision.smallest_slope_angle() - 45.0).abs() < 1e-3);
        assert!(collision.ground_forward.dot(collision.ground_normal).abs() < 1e-5);
    }
}
