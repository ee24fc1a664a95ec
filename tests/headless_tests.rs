//! Integration tests for headless scenario execution
//!
//! These tests verify that:
//! - Scenarios run to completion and report a winner
//! - Runs without a winner stop at the max duration
//! - Broken references are rejected before anything spawns
//! - Seeded RNG produces deterministic results
//! - The shipped scenario and definitions load together
//! - Reports carry the run phase, depth and score

use std::path::Path;

use bevy::prelude::*;

use homebound::headless::{ScenarioConfig, ScenarioOutcome, ScenarioRunner};
use homebound::sim::abilities::{load_ability_definitions, AbilityDefinitions, AbilityId};
use homebound::sim::ai::{load_state_machines, StateMachineDefinitions};
use homebound::sim::components::EntityKind;
use homebound::sim::input::{InputButton, InputStep, ScriptedInput};
use homebound::sim::spawn::EntityBlueprint;
use homebound::sim::status::StatusConfig;

const SLASH: &str = r#"(
    abilities: {
        "slash": (
            name: "Slash",
            cooldown: (kind: Timed, time: 0.6),
            events: [
                (
                    interaction: (
                        duration: 0.2,
                        movement: (start_offset: (0.0, 1.0, -1.2), reset_to_base_position: true),
                        collider: (shape: Sphere(radius: 1.2), hit_mask: 4),
                        damage: (value: 25.0, damage_type: Physical),
                    ),
                ),
            ],
        ),
    },
)"#;

fn slash_definitions() -> AbilityDefinitions {
    AbilityDefinitions::from_ron_str(SLASH).expect("valid RON")
}

/// A player holding Action0 with a dummy right in front of it.
fn duel(dummy_health: f32) -> ScenarioConfig {
    let mut hero = EntityBlueprint::new("hero", EntityKind::Player, Vec3::ZERO);
    hero.abilities = vec![AbilityId::new("slash")];
    hero.input = Some(ScriptedInput {
        steps: vec![InputStep {
            start: 0.0,
            end: 5.0,
            buttons: vec![InputButton::Action0],
            ..default()
        }],
    });

    let mut dummy = EntityBlueprint::new("dummy", EntityKind::Enemy, Vec3::new(0.0, 0.0, -1.5));
    dummy.status = StatusConfig {
        max_health: dummy_health,
        ..default()
    };

    let mut config = ScenarioConfig::new("duel", vec![hero, dummy]);
    config.max_duration_secs = 10.0;
    config.random_seed = Some(42);
    config
}

fn shipped_definitions() -> (AbilityDefinitions, StateMachineDefinitions) {
    let abilities = load_ability_definitions(Path::new("assets/config/abilities.ron")).expect("shipped abilities");
    let machines = load_state_machines(Path::new("assets/config/ai_states.ron")).expect("shipped machines");
    (abilities, machines)
}

fn skirmish(max_duration_secs: f32) -> ScenarioConfig {
    let mut config =
        ScenarioConfig::load_from_file(Path::new("assets/scenarios/skirmish.json")).expect("shipped scenario");
    config.max_duration_secs = max_duration_secs;
    config
}

// =============================================================================
// Outcome Tests
// =============================================================================

#[test]
fn test_player_wins_when_last_enemy_dies() {
    let mut runner =
        ScenarioRunner::new(duel(40.0), slash_definitions(), StateMachineDefinitions::default()).expect("valid duel");
    let max_ticks = runner.max_ticks();

    let result = runner.run();

    assert_eq!(result.outcome, ScenarioOutcome::PlayersWin);
    assert!(result.ticks < max_ticks, "the run should stop as soon as the dummy dies");

    let hero = result.entity("hero").expect("hero reported");
    assert!(hero.survived);
    assert_eq!(hero.damage_dealt, 50.0);
    assert_eq!(hero.killing_blows, 1);

    let dummy = result.entity("dummy").expect("dummy reported");
    assert!(!dummy.survived);
    assert_eq!(dummy.final_health, 0.0);
    assert_eq!(dummy.damage_taken, 50.0);
}

#[test]
fn test_run_without_winner_times_out() {
    let mut config = duel(40.0);
    // Out of reach and never attacking
    config.entities[1].position = Vec3::new(0.0, 0.0, -30.0);
    config.entities[0].input = None;
    config.max_duration_secs = 0.5;

    let mut runner =
        ScenarioRunner::new(config, slash_definitions(), StateMachineDefinitions::default()).expect("valid config");
    let result = runner.run();

    assert_eq!(result.outcome, ScenarioOutcome::Timeout);
    assert_eq!(result.ticks, 30);
    assert!((result.duration - 0.5).abs() < 1e-3);
    assert!(result.entities.iter().all(|e| e.survived));
}

#[test]
fn test_missing_side_is_never_eliminated() {
    let mut config = duel(40.0);
    config.entities.truncate(1);
    config.max_duration_secs = 0.25;

    let mut runner =
        ScenarioRunner::new(config, slash_definitions(), StateMachineDefinitions::default()).expect("valid config");
    runner.step();
    assert_eq!(runner.check_elimination(), None);
    assert_eq!(runner.run().outcome, ScenarioOutcome::Timeout);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_unknown_ability_is_rejected() {
    let result = ScenarioRunner::new(duel(40.0), AbilityDefinitions::default(), StateMachineDefinitions::default());
    let Err(message) = result else {
        panic!("an undefined ability should be rejected");
    };
    assert!(message.contains("unknown ability 'slash'"), "got: {}", message);
}

#[test]
fn test_unknown_state_machine_is_rejected() {
    let mut config = duel(40.0);
    config.entities[1].state_machine = Some("berserker".to_string());

    let result = ScenarioRunner::new(config, slash_definitions(), StateMachineDefinitions::default());
    let Err(message) = result else {
        panic!("an undefined machine should be rejected");
    };
    assert!(message.contains("berserker"));
}

#[test]
fn test_invalid_scenario_is_rejected() {
    let config = ScenarioConfig::new("empty", Vec::new());
    assert!(ScenarioRunner::new(config, AbilityDefinitions::default(), StateMachineDefinitions::default()).is_err());
}

// =============================================================================
// Shipped Scenario Tests
// =============================================================================

#[test]
fn test_shipped_skirmish_spawns() {
    let (abilities, machines) = shipped_definitions();
    let runner = ScenarioRunner::new(skirmish(5.0), abilities, machines).expect("skirmish is consistent");

    assert_eq!(runner.entities().len(), 3);
    for name in ["hero", "grunt_a", "grunt_b"] {
        assert!(runner.entity(name).is_some(), "{} should be spawned", name);
    }
    assert!(runner.entity("nobody").is_none());
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let run = || {
        let (abilities, machines) = shipped_definitions();
        let mut runner = ScenarioRunner::new(skirmish(8.0), abilities, machines).expect("skirmish is consistent");
        runner.run()
    };

    let first = run();
    let second = run();

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.random_seed, Some(7));
    for (a, b) in first.entities.iter().zip(&second.entities) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.final_health, b.final_health);
        assert_eq!(a.final_position, b.final_position);
        assert_eq!(a.final_state, b.final_state);
    }
}

#[test]
fn test_ai_entities_report_their_state() {
    let (abilities, machines) = shipped_definitions();
    let mut runner = ScenarioRunner::new(skirmish(1.0), abilities, machines).expect("skirmish is consistent");
    let result = runner.run();

    assert!(result.entity("hero").expect("hero").final_state.is_none());
    assert!(result.entity("grunt_a").expect("grunt_a").final_state.is_some());
    assert!(result.entity("grunt_b").expect("grunt_b").final_state.is_some());
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_report_contains_result_and_log() {
    let mut runner =
        ScenarioRunner::new(duel(40.0), slash_definitions(), StateMachineDefinitions::default()).expect("valid duel");
    let result = runner.run();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.json");
    runner.save_report(&result, &path).expect("report written");

    let contents = std::fs::read_to_string(&path).expect("report readable");
    let report: serde_json::Value = serde_json::from_str(&contents).expect("report is JSON");

    assert_eq!(report["result"]["outcome"], "PlayersWin");
    assert_eq!(report["result"]["scenario"], "duel");
    assert_eq!(report["result"]["game_phase"], "Playing");
    assert_eq!(report["result"]["depth"], 0.0);
    assert!(report["result"]["score"].is_number());
    assert!(report["result"]["high_scores"].as_array().expect("score board").is_empty());
    let entries = report["combat_log"]["entries"].as_array().expect("log entries");
    assert!(entries.len() >= 4, "start, two hits, death and end should be logged");
}
