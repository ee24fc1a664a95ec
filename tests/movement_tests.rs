//! Integration tests for movement inside the full tick pipeline
//!
//! These tests verify that:
//! - Scripted input walks an entity along the forward axis and turns it
//! - Slows scale the distance covered
//! - Knockback takes over from input while it lasts
//! - Airborne entities fall onto the ground plane and stay there

use bevy::prelude::*;

use homebound::headless::{ScenarioConfig, ScenarioRunner};
use homebound::sim::abilities::AbilityDefinitions;
use homebound::sim::ai::StateMachineDefinitions;
use homebound::sim::components::EntityKind;
use homebound::sim::curve::EasingCurve;
use homebound::sim::input::{InputStep, ScriptedInput};
use homebound::sim::movement::MovementState;
use homebound::sim::physics::CollisionState;
use homebound::sim::spawn::EntityBlueprint;
use homebound::sim::{SimClock, SimulationSpeed};
use homebound::sim::status::{StatusEffect, StatusEffectKind, StatusState};

/// A lone player pushing the stick in one direction for `seconds`.
fn walker(x: f32, y: f32, seconds: f32) -> EntityBlueprint {
    let mut walker = EntityBlueprint::new("walker", EntityKind::Player, Vec3::ZERO);
    walker.input = Some(ScriptedInput {
        steps: vec![InputStep {
            start: 0.0,
            end: seconds,
            x,
            y,
            ..default()
        }],
    });
    walker
}

fn runner_for(entities: Vec<EntityBlueprint>) -> ScenarioRunner {
    let config = ScenarioConfig::new("movement", entities);
    ScenarioRunner::new(config, AbilityDefinitions::default(), StateMachineDefinitions::default())
        .expect("valid scenario")
}

fn steps(runner: &mut ScenarioRunner, count: usize) {
    for _ in 0..count {
        runner.step();
    }
}

fn transform_of(runner: &ScenarioRunner, name: &str) -> Transform {
    let entity = runner.entity(name).expect("spawned");
    *runner.app().world().get::<Transform>(entity).expect("has transform")
}

fn add_effect(runner: &mut ScenarioRunner, name: &str, effect: StatusEffect, impact_point: Vec3) {
    let entity = runner.entity(name).expect("spawned");
    let now = runner.app().world().resource::<SimClock>().elapsed;
    let position = transform_of(runner, name).translation;
    let mut status = runner
        .app_mut()
        .world_mut()
        .get_mut::<StatusState>(entity)
        .expect("has status");
    assert!(status.add_effect(effect, position, impact_point, now));
}

// =============================================================================
// Input Tests
// =============================================================================

#[test]
fn test_forward_input_walks_along_negative_z() {
    let mut runner = runner_for(vec![walker(0.0, 1.0, 10.0)]);
    steps(&mut runner, 60);

    let transform = transform_of(&runner, "walker");
    assert!(transform.translation.z < -3.0, "got {:?}", transform.translation);
    assert!(transform.translation.x.abs() < 1e-3);
    assert_eq!(transform.translation.y, 0.0);
}

#[test]
fn test_strafe_input_turns_toward_movement() {
    let mut runner = runner_for(vec![walker(1.0, 0.0, 10.0)]);
    steps(&mut runner, 120);

    let transform = transform_of(&runner, "walker");
    assert!(transform.translation.x > 5.0);
    let facing = transform.rotation * Vec3::NEG_Z;
    assert!((facing - Vec3::X).length() < 0.05, "facing {:?}", facing);
}

#[test]
fn test_released_input_comes_to_rest() {
    let mut runner = runner_for(vec![walker(0.0, 1.0, 0.5)]);
    steps(&mut runner, 120);
    let resting = transform_of(&runner, "walker").translation;

    steps(&mut runner, 30);
    let later = transform_of(&runner, "walker").translation;
    assert!(resting.distance(later) < 1e-3);
}

// =============================================================================
// Status Effect Tests
// =============================================================================

#[test]
fn test_slow_shortens_the_distance_covered() {
    let mut normal = runner_for(vec![walker(0.0, 1.0, 10.0)]);
    let mut slowed = runner_for(vec![walker(0.0, 1.0, 10.0)]);
    add_effect(
        &mut slowed,
        "walker",
        StatusEffect {
            kind: StatusEffectKind::Slowed,
            length: 10.0,
            curve: EasingCurve::Constant,
            strength: 0.5,
        },
        Vec3::Z,
    );

    steps(&mut normal, 60);
    steps(&mut slowed, 60);

    let full = transform_of(&normal, "walker").translation.length();
    let half = transform_of(&slowed, "walker").translation.length();
    assert!(half < full * 0.6, "slowed {} vs normal {}", half, full);
    assert!(half > full * 0.4);
}

#[test]
fn test_knockback_overrides_input() {
    let mut runner = runner_for(vec![walker(0.0, 1.0, 10.0)]);
    // Hit from the front: pushed toward +Z while trying to walk to -Z
    add_effect(
        &mut runner,
        "walker",
        StatusEffect {
            kind: StatusEffectKind::Knockback,
            length: 0.5,
            curve: EasingCurve::Constant,
            strength: 2.0,
        },
        Vec3::NEG_Z,
    );

    steps(&mut runner, 15);
    assert!(transform_of(&runner, "walker").translation.z > 0.5);

    // Once the push expires, input takes over again
    steps(&mut runner, 120);
    assert!(transform_of(&runner, "walker").translation.z < 0.0);
}

// =============================================================================
// Gravity Tests
// =============================================================================

#[test]
fn test_airborne_entity_lands_on_ground() {
    let faller = EntityBlueprint::new("faller", EntityKind::Player, Vec3::new(0.0, 3.0, 0.0));
    let mut runner = runner_for(vec![faller]);

    runner.step();
    let entity = runner.entity("faller").expect("spawned");
    assert!(!runner.app().world().get::<CollisionState>(entity).expect("collision").is_grounded);

    steps(&mut runner, 120);
    let world = runner.app().world();
    assert_eq!(transform_of(&runner, "faller").translation.y, 0.0);
    assert!(world.get::<CollisionState>(entity).expect("collision").is_grounded);
    assert_eq!(world.get::<MovementState>(entity).expect("movement").vertical_velocity, 0.0);
}

#[test]
fn test_paused_simulation_does_not_move() {
    let mut runner = runner_for(vec![walker(0.0, 1.0, 10.0)]);
    steps(&mut runner, 10);
    let before = transform_of(&runner, "walker").translation;

    runner
        .app_mut()
        .world_mut()
        .resource_mut::<SimulationSpeed>()
        .pause();
    steps(&mut runner, 30);

    assert_eq!(transform_of(&runner, "walker").translation, before);
}
