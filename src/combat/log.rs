//! Run log
//!
//! Records gameplay events for post-run analysis. Entries carry a readable
//! message and, where useful, structured data so results can be aggregated
//! without parsing text.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatLogEventType {
    Damage,
    /// Ability activated
    AbilityUsed,
    /// Status effect admitted
    StatusApplied,
    /// AI state switch
    StateChange,
    Death,
    /// Run event (start, end, etc.)
    SimEvent,
}

/// Machine-readable payload of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredEventData {
    Damage {
        source: String,
        target: String,
        ability: String,
        amount: f32,
        killing_blow: bool,
    },
    StateChange {
        entity: String,
        from: Option<String>,
        to: String,
    },
    Death {
        victim: String,
        killer: Option<String>,
    },
}

/// One timestamped log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Simulation time in seconds
    pub timestamp: f32,
    pub event_type: CombatLogEventType,
    /// Readable summary
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Everything that happened during a run, oldest first.
#[derive(Resource, Default, Debug, Clone, Serialize, Deserialize)]
pub struct CombatLog {
    pub entries: Vec<CombatLogEntry>,
    /// Clock time stamped onto new entries
    pub sim_time: f32,
}

impl CombatLog {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sim_time = 0.0;
    }

    /// Append an entry without structured data.
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.sim_time,
            event_type,
            message,
            data,
        });
    }

    pub fn log_damage(
        &mut self,
        source: String,
        target: String,
        ability: String,
        amount: f32,
        killing_blow: bool,
        message: String,
    ) {
        let data = StructuredEventData::Damage {
            source,
            target,
            ability,
            amount,
            killing_blow,
        };
        self.push(CombatLogEventType::Damage, message, Some(data));
    }

    pub fn log_state_change(&mut self, entity: String, from: Option<String>, to: String, message: String) {
        let data = StructuredEventData::StateChange { entity, from, to };
        self.push(CombatLogEventType::StateChange, message, Some(data));
    }

    pub fn log_death(&mut self, victim: String, killer: Option<String>, message: String) {
        let data = StructuredEventData::Death { victim, killer };
        self.push(CombatLogEventType::Death, message, Some(data));
    }

    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// The newest `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn damage_entries(&self) -> impl Iterator<Item = (&str, &str, &str, f32, bool)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }) => Some((source.as_str(), target.as_str(), ability.as_str(), *amount, *killing_blow)),
            _ => None,
        })
    }

    /// Total damage per ability dealt by `source`
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (from, _, ability, amount, _) in self.damage_entries() {
            if from == source {
                *totals.entry(ability.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> f32 {
        self.damage_entries()
            .filter(|(from, ..)| *from == source)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn total_damage_taken(&self, target: &str) -> f32 {
        self.damage_entries()
            .filter(|(_, to, ..)| *to == target)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.damage_entries()
            .filter(|(from, _, _, _, killing)| *from == source && *killing)
            .count()
    }

    /// States `entity` entered, in order
    pub fn state_history(&self, entity: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::StateChange { entity: who, to, .. }) if who == entity => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of everything that died, in order
    pub fn deaths(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::Death { victim, .. }) => Some(victim.clone()),
                _ => None,
            })
            .collect()
    }

    /// Write the log as pretty-printed JSON
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        info!("Combat log saved to {}", path.display());
        Ok(())
    }
}
