//! Unit tests for combat log query and aggregation methods
//!
//! These tests verify that the CombatLog correctly:
//! - Aggregates damage by ability, source and target
//! - Counts killing blows
//! - Tracks AI state history and deaths
//! - Stamps entries with the current simulation time

use homebound::combat::log::{CombatLog, CombatLogEventType, StructuredEventData};

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

fn damage(log: &mut CombatLog, source: &str, target: &str, ability: &str, amount: f32, killing_blow: bool) {
    log.log_damage(
        source.to_string(),
        target.to_string(),
        ability.to_string(),
        amount,
        killing_blow,
        "Test".to_string(),
    );
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_by_ability_empty_log() {
    let log = create_test_log();
    let damage = log.damage_by_ability("hero");
    assert!(damage.is_empty(), "Empty log should return empty damage map");
}

#[test]
fn test_damage_by_ability_single_source() {
    let mut log = create_test_log();

    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    damage(&mut log, "hero", "grunt_b", "Frost Bolt", 12.0, false);

    let damage = log.damage_by_ability("hero");

    assert_eq!(damage.len(), 2, "Should have 2 different abilities");
    assert_eq!(damage.get("Slash"), Some(&50.0));
    assert_eq!(damage.get("Frost Bolt"), Some(&12.0));
}

#[test]
fn test_damage_by_ability_ignores_other_sources() {
    let mut log = create_test_log();

    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    damage(&mut log, "grunt_a", "hero", "Claw", 10.0, false);

    assert_eq!(log.damage_by_ability("hero").get("Claw"), None);
    assert_eq!(log.damage_by_ability("grunt_a").get("Claw"), Some(&10.0));
}

#[test]
fn test_total_damage_dealt_and_taken() {
    let mut log = create_test_log();

    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    damage(&mut log, "hero", "grunt_b", "Shockwave", 10.0, false);
    damage(&mut log, "grunt_a", "hero", "Claw", 8.0, false);
    damage(&mut log, "grunt_b", "hero", "Claw", 8.0, false);

    assert_eq!(log.total_damage_dealt("hero"), 35.0);
    assert_eq!(log.total_damage_taken("hero"), 16.0);
    assert_eq!(log.total_damage_taken("grunt_a"), 25.0);
    assert_eq!(log.total_damage_dealt("nobody"), 0.0);
}

#[test]
fn test_killing_blows() {
    let mut log = create_test_log();

    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, true);
    damage(&mut log, "hero", "grunt_b", "Lunge", 40.0, true);
    damage(&mut log, "grunt_b", "hero", "Claw", 10.0, false);

    assert_eq!(log.killing_blows("hero"), 2);
    assert_eq!(log.killing_blows("grunt_b"), 0);
}

// =============================================================================
// State and Death Tracking Tests
// =============================================================================

#[test]
fn test_state_history_in_order() {
    let mut log = create_test_log();

    log.log_state_change("grunt_a".to_string(), None, "patrol".to_string(), "enter".to_string());
    log.log_state_change(
        "grunt_b".to_string(),
        None,
        "idle".to_string(),
        "enter".to_string(),
    );
    log.log_state_change(
        "grunt_a".to_string(),
        Some("patrol".to_string()),
        "chase".to_string(),
        "switch".to_string(),
    );

    assert_eq!(log.state_history("grunt_a"), vec!["patrol".to_string(), "chase".to_string()]);
    assert_eq!(log.state_history("grunt_b"), vec!["idle".to_string()]);
    assert!(log.state_history("hero").is_empty());
}

#[test]
fn test_deaths_record_killer() {
    let mut log = create_test_log();

    log.log_death("grunt_a".to_string(), Some("hero".to_string()), "grunt_a died".to_string());

    assert_eq!(log.deaths(), vec!["grunt_a".to_string()]);
    let entry = &log.filter_by_type(CombatLogEventType::Death)[0];
    assert_eq!(
        entry.data,
        Some(StructuredEventData::Death {
            victim: "grunt_a".to_string(),
            killer: Some("hero".to_string()),
        })
    );
}

// =============================================================================
// General Log Tests
// =============================================================================

#[test]
fn test_entries_use_current_sim_time() {
    let mut log = create_test_log();

    log.log(CombatLogEventType::SimEvent, "start".to_string());
    log.sim_time = 2.5;
    log.log(CombatLogEventType::AbilityUsed, "hero used Slash".to_string());

    assert_eq!(log.entries[0].timestamp, 0.0);
    assert_eq!(log.entries[1].timestamp, 2.5);
}

#[test]
fn test_filter_by_type_and_recent() {
    let mut log = create_test_log();

    log.log(CombatLogEventType::SimEvent, "start".to_string());
    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    log.log(CombatLogEventType::AbilityUsed, "hero used Slash".to_string());
    log.log(CombatLogEventType::SimEvent, "end".to_string());

    assert_eq!(log.filter_by_type(CombatLogEventType::SimEvent).len(), 2);
    assert_eq!(log.filter_by_type(CombatLogEventType::Damage).len(), 1);

    let recent = log.recent(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].message, "hero used Slash");
    assert_eq!(recent[1].message, "end");
}

#[test]
fn test_clear_resets_log() {
    let mut log = create_test_log();
    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, false);
    log.sim_time = 10.0;

    log.clear();

    assert!(log.entries.is_empty());
    assert_eq!(log.sim_time, 0.0);
}

#[test]
fn test_save_to_file_writes_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.json");
    let mut log = create_test_log();
    damage(&mut log, "hero", "grunt_a", "Slash", 25.0, true);

    log.save_to_file(&path).expect("save");

    let contents = std::fs::read_to_string(&path).expect("read back");
    let parsed: CombatLog = serde_json::from_str(&contents).expect("valid JSON");
    assert_eq!(parsed.killing_blows("hero"), 1);
}
