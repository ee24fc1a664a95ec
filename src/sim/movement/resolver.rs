//! Motion resolver: turns the winning [`MovementInfo`] into a velocity and a facing.

use bevy::ecs::query::Has;
use bevy::prelude::*;

use super::{select_movement_override, MovementConfig, MovementInfo, MovementModifier, MovementSource, MovementSpace};
use crate::sim::abilities::AbilityState;
use crate::sim::clock::SimClock;
use crate::sim::components::{EntityKind, SimEntity};
use crate::sim::constants::MIN_NAVIGATION_SPEED;
use crate::sim::game::{GameFlow, MovementDisabled};
use crate::sim::input::InputState;
use crate::sim::math::{project_on_plane, smooth_damp, smooth_damp_angle, yaw_of, yaw_toward};
use crate::sim::navigation::NavigationState;
use crate::sim::physics::CollisionState;
use crate::sim::status::StatusState;

/// Per-entity motion integration state.
#[derive(Component, Clone, Debug)]
pub struct MovementState {
    /// Smoothed ground speed
    pub current_speed: f32,
    speed_velocity: f32,
    /// Smoothed slope-slide speed
    pub slide_speed: f32,
    slide_velocity: f32,
    yaw_velocity: f32,
    /// Remaining grace time on an unwalkable slope before sliding
    pub slip_timer: f32,
    /// Accumulated fall speed while airborne
    pub vertical_velocity: f32,
    /// Rotation applied to raw input (camera yaw in a client)
    pub input_rotation_offset: Quat,
    /// Velocity resolved on the last tick
    pub velocity: Vec3,
}

impl MovementState {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            current_speed: 0.0,
            speed_velocity: 0.0,
            slide_speed: 0.0,
            slide_velocity: 0.0,
            yaw_velocity: 0.0,
            slip_timer: config.slip_time,
            vertical_velocity: 0.0,
            input_rotation_offset: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }

    /// Velocity for this tick.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_velocity(
        &mut self,
        config: &MovementConfig,
        info: MovementInfo,
        modifier: MovementModifier,
        collision: &CollisionState,
        raw_input: Vec3,
        rotation: Quat,
        dt: f32,
    ) -> Vec3 {
        let info = to_world_space(info, rotation);
        match info.source {
            MovementSource::Input => self.input_velocity(config, &info, modifier, collision, dt),
            MovementSource::Navigation => self.navigation_velocity(config, &info, modifier, collision, dt),
            MovementSource::Action | MovementSource::Status => {
                self.action_velocity(config, &info, modifier, collision, raw_input, dt)
            }
            MovementSource::None => Vec3::Y * self.gravity_step(config, collision, dt),
        }
    }

    fn input_velocity(
        &mut self,
        config: &MovementConfig,
        info: &MovementInfo,
        modifier: MovementModifier,
        collision: &CollisionState,
        dt: f32,
    ) -> Vec3 {
        let direction = if info.use_forward {
            collision.ground_forward
        } else {
            project_on_plane(self.input_rotation_offset * info.movement, collision.ground_normal)
        }
        .clamp_length_max(1.0);

        let target_speed = direction.length() * config.base_speed;
        let velocity = self.ground_velocity(config, direction, target_speed, collision, dt);
        self.finish_ground_velocity(config, info, velocity, modifier, collision, dt)
    }

    fn navigation_velocity(
        &mut self,
        config: &MovementConfig,
        info: &MovementInfo,
        modifier: MovementModifier,
        collision: &CollisionState,
        dt: f32,
    ) -> Vec3 {
        let direction = if info.use_forward {
            collision.ground_forward
        } else {
            project_on_plane(info.movement, collision.ground_normal)
        };

        let target_speed = info.movement.length().max(MIN_NAVIGATION_SPEED);
        let velocity = self.ground_velocity(config, direction, target_speed, collision, dt);
        self.finish_ground_velocity(config, info, velocity, modifier, collision, dt)
    }

    fn ground_velocity(
        &mut self,
        config: &MovementConfig,
        direction: Vec3,
        target_speed: f32,
        collision: &CollisionState,
        dt: f32,
    ) -> Vec3 {
        let smoothing = if collision.is_grounded {
            config.grounded_smoothing
        } else {
            config.airborne_smoothing
        };
        self.current_speed = smooth_damp(self.current_speed, target_speed, &mut self.speed_velocity, smoothing, dt);
        direction.normalize_or_zero() * self.current_speed
    }

    /// Modifier, gravity and slope sliding shared by input and navigation.
    fn finish_ground_velocity(
        &mut self,
        config: &MovementConfig,
        info: &MovementInfo,
        mut velocity: Vec3,
        modifier: MovementModifier,
        collision: &CollisionState,
        dt: f32,
    ) -> Vec3 {
        if !modifier.is_none() {
            velocity *= modifier.effectiveness;
        }
        if info.use_gravity {
            velocity.y += self.gravity_step(config, collision, dt);
        }
        if self.is_on_max_slope(config, collision) && self.is_slipping(dt) {
            velocity = self.slope_velocity(config, collision, dt);
        }
        velocity
    }

    fn action_velocity(
        &mut self,
        config: &MovementConfig,
        info: &MovementInfo,
        modifier: MovementModifier,
        collision: &CollisionState,
        raw_input: Vec3,
        dt: f32,
    ) -> Vec3 {
        let mut velocity = if info.use_forward {
            collision.ground_forward * info.movement.length()
        } else {
            project_on_plane(info.movement, collision.ground_normal)
        };

        if info.input_modifier > 0.0 {
            let magnitude = velocity.length();
            let nudge = self.input_rotation_offset * raw_input * info.input_modifier;
            velocity = (velocity.normalize_or_zero() + nudge).normalize_or_zero() * magnitude;
        }

        if info.source == MovementSource::Status && !modifier.is_none() {
            velocity *= modifier.effectiveness;
        }
        if info.use_gravity {
            velocity.y += self.gravity_step(config, collision, dt);
        }
        velocity
    }

    /// Integrate fall speed. Grounded entities stop falling immediately.
    pub fn gravity_step(&mut self, config: &MovementConfig, collision: &CollisionState, dt: f32) -> f32 {
        if collision.is_grounded {
            self.vertical_velocity = 0.0;
        } else {
            self.vertical_velocity += config.gravity * dt;
        }
        self.vertical_velocity
    }

    /// True while standing on a slope steeper than the walkable limit.
    /// Leaving such a slope refills the slip timer and stops any slide.
    pub fn is_on_max_slope(&mut self, config: &MovementConfig, collision: &CollisionState) -> bool {
        if collision.is_on_slope && collision.smallest_slope_angle() > config.max_walkable_slope_angle {
            return true;
        }
        self.slide_speed = 0.0;
        self.slide_velocity = 0.0;
        self.slip_timer = config.slip_time;
        false
    }

    /// Count down the slip grace time; true once it has run out.
    pub fn is_slipping(&mut self, dt: f32) -> bool {
        if self.slip_timer <= 0.0 {
            return true;
        }
        self.slip_timer -= dt;
        false
    }

    fn slope_velocity(&mut self, config: &MovementConfig, collision: &CollisionState, dt: f32) -> Vec3 {
        let normal = collision.ground_normal;
        let downhill = -(normal.cross(Vec3::Y).cross(normal)).normalize_or_zero();

        let steepness = if config.max_slope_slide_angle > 0.0 {
            collision.average_slope_angle() / config.max_slope_slide_angle
        } else {
            0.0
        };
        let target = config.slide_speed * (1.0 + steepness);
        self.slide_speed = smooth_damp(self.slide_speed, target, &mut self.slide_velocity, config.slide_smoothing, dt);
        downhill * self.slide_speed
    }

    /// Facing for this tick. Input and navigation turn toward their direction;
    /// abilities and status effects keep the current facing.
    pub fn resolve_yaw(
        &mut self,
        config: &MovementConfig,
        info: &MovementInfo,
        collision: &CollisionState,
        rotation: Quat,
        dt: f32,
    ) -> f32 {
        let current = yaw_of(rotation);
        let info = to_world_space(*info, rotation);
        let facing = match info.source {
            MovementSource::Input => self.input_rotation_offset * info.movement,
            MovementSource::Navigation => info.movement,
            _ => return current,
        };
        let Some(target) = yaw_toward(facing) else {
            return current;
        };

        let smoothing = if collision.is_grounded {
            config.grounded_rotation_smoothing
        } else {
            config.airborne_rotation_smoothing
        };
        smooth_damp_angle(current, target, &mut self.yaw_velocity, smoothing, dt)
    }
}

fn to_world_space(mut info: MovementInfo, rotation: Quat) -> MovementInfo {
    if info.space == MovementSpace::Local {
        info.movement = rotation * info.movement;
        info.space = MovementSpace::World;
    }
    info
}

/// Apply the winning movement source to every entity. Players only move while
/// the run is being played, and stopped entities do not move at all.
#[allow(clippy::type_complexity)]
pub fn resolve_movement(
    clock: Res<SimClock>,
    flow: Res<GameFlow>,
    mut query: Query<(
        &SimEntity,
        &mut Transform,
        &mut MovementState,
        &MovementConfig,
        &CollisionState,
        &InputState,
        &StatusState,
        &AbilityState,
        &NavigationState,
        Has<MovementDisabled>,
    )>,
) {
    let dt = clock.delta;
    if dt <= 0.0 {
        return;
    }

    for (entity, mut transform, mut state, config, collision, input, status, abilities, navigation, disabled) in
        query.iter_mut()
    {
        if !entity.capture.movement || disabled {
            continue;
        }
        if entity.kind == EntityKind::Player && !flow.is_playing() {
            continue;
        }

        let raw_input = input.movement_vector();
        let info = select_movement_override(status.movement_override(), abilities.movement(), navigation.movement())
            .unwrap_or_else(|| MovementInfo::input(raw_input));

        let velocity = state.resolve_velocity(
            config,
            info,
            status.movement_modifier(),
            collision,
            raw_input,
            transform.rotation,
            dt,
        );
        transform.translation += velocity * dt;

        let yaw = state.resolve_yaw(config, &info, collision, transform.rotation, dt);
        transform.rotation = Quat::from_rotation_y(yaw);
        state.velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded() -> CollisionState {
        let mut collision = CollisionState::default();
        collision.set_contacts(&[Vec3::Y], Vec3::NEG_Z);
        collision
    }

    #[test]
    fn test_input_speed_ramps_toward_base_speed() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let collision = grounded();
        let info = MovementInfo::input(Vec3::new(3.0, 0.0, 0.0));

        let mut velocity = Vec3::ZERO;
        for _ in 0..120 {
            velocity = state.resolve_velocity(&config, info, MovementModifier::NONE, &collision, Vec3::ZERO, Quat::IDENTITY, DT);
        }
        // Oversized input is clamped to unit length
        assert!((velocity.length() - config.base_speed).abs() < 0.05, "got {}", velocity.length());
        assert!(velocity.x > 0.0);
    }

    #[test]
    fn test_stun_modifier_freezes_input() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let stunned = MovementModifier {
            source: MovementSource::Status,
            force: Vec3::ZERO,
            effectiveness: 0.0,
        };
        let velocity = state.resolve_velocity(
            &config,
            MovementInfo::input(Vec3::X),
            stunned,
            &grounded(),
            Vec3::ZERO,
            Quat::IDENTITY,
            DT,
        );
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn test_navigation_speed_floor() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let info = MovementInfo::new(MovementSource::Navigation, Vec3::X * 0.1, true);

        let mut velocity = Vec3::ZERO;
        for _ in 0..300 {
            velocity = state.resolve_velocity(&config, info, MovementModifier::NONE, &grounded(), Vec3::ZERO, Quat::IDENTITY, DT);
        }
        assert!((velocity.length() - MIN_NAVIGATION_SPEED).abs() < 0.01);
    }

    #[test]
    fn test_action_input_nudge_preserves_magnitude() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let mut info = MovementInfo::new(MovementSource::Action, Vec3::NEG_Z * 10.0, false);
        info.input_modifier = 0.5;

        let velocity = state.resolve_velocity(&config, info, MovementModifier::NONE, &grounded(), Vec3::X, Quat::IDENTITY, DT);
        assert!((velocity.length() - 10.0).abs() < 1e-4);
        assert!(velocity.x > 0.0, "input should bend the dash sideways");
    }

    #[test]
    fn test_local_space_action_follows_facing() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let mut info = MovementInfo::new(MovementSource::Action, Vec3::NEG_Z * 4.0, false);
        info.space = MovementSpace::Local;

        let facing_right = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let velocity = state.resolve_velocity(&config, info, MovementModifier::NONE, &grounded(), Vec3::ZERO, facing_right, DT);
        assert!((velocity - Vec3::X * 4.0).length() < 1e-4, "got {:?}", velocity);
    }

    #[test]
    fn test_gravity_accumulates_and_resets() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let airborne = CollisionState::default();

        state.gravity_step(&config, &airborne, 0.5);
        let falling = state.gravity_step(&config, &airborne, 0.5);
        assert!((falling - config.gravity).abs() < 1e-5);

        assert_eq!(state.gravity_step(&config, &grounded(), 0.5), 0.0);
    }

    #[test]
    fn test_slope_slip_only_after_grace() {
        let config = MovementConfig {
            slip_time: 0.1,
            ..default()
        };
        let mut state = MovementState::new(&config);
        let mut steep = CollisionState::default();
        steep.set_contacts(&[Vec3::new(0.0, 1.0, 2.0).normalize()], Vec3::NEG_Z);
        let info = MovementInfo::input(Vec3::ZERO);

        let first = state.resolve_velocity(&config, info, MovementModifier::NONE, &steep, Vec3::ZERO, Quat::IDENTITY, 0.05);
        assert!(first.z.abs() < 1e-6, "no slide during grace time");

        let mut velocity = Vec3::ZERO;
        for _ in 0..10 {
            velocity = state.resolve_velocity(&config, info, MovementModifier::NONE, &steep, Vec3::ZERO, Quat::IDENTITY, 0.05);
        }
        assert!(velocity.z > 0.0 && velocity.y < 0.0, "should slide downhill, got {:?}", velocity);

        // Stepping off the slope refills the grace timer
        state.resolve_velocity(&config, info, MovementModifier::NONE, &grounded(), Vec3::ZERO, Quat::IDENTITY, 0.05);
        assert_eq!(state.slip_timer, config.slip_time);
        assert_eq!(state.slide_speed, 0.0);
    }

    #[test]
    fn test_yaw_turns_toward_input_only() {
        let config = MovementConfig::default();
        let mut state = MovementState::new(&config);
        let collision = grounded();

        let mut rotation = Quat::IDENTITY;
        for _ in 0..240 {
            let yaw = state.resolve_yaw(&config, &MovementInfo::input(Vec3::X), &collision, rotation, DT);
            rotation = Quat::from_rotation_y(yaw);
        }
        assert!((rotation * Vec3::NEG_Z - Vec3::X).length() < 0.01);

        let dash = MovementInfo::new(MovementSource::Action, Vec3::NEG_Z, false);
        let yaw = state.resolve_yaw(&config, &dash, &collision, rotation, DT);
        assert!((yaw - yaw_of(rotation)).abs() < 1e-6);
    }
}
