//! AI state graphs loaded from `assets/config/ai_states.ron`.
//!
//! A machine is a set of named states. Each state lists the actions it runs
//! every tick and the transitions it checks afterwards. States listed under
//! `any_states` are checked first, from whatever state the entity is in.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::strategies::{ActionKind, DecisionKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub String);

impl StateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decision plus where to go on either outcome. `None` means stay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub decision: DecisionKind,
    #[serde(default)]
    pub true_state: Option<StateId>,
    #[serde(default)]
    pub false_state: Option<StateId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub actions: Vec<ActionKind>,
    pub transitions: Vec<TransitionConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateMachineConfig {
    pub initial: StateId,
    /// Interrupt states, checked in order before the current state runs
    #[serde(default)]
    pub any_states: Vec<StateId>,
    pub states: HashMap<StateId, StateConfig>,
}

impl StateMachineConfig {
    pub fn state(&self, id: &StateId) -> Option<&StateConfig> {
        self.states.get(id)
    }

    /// Every state id referenced by this machine that has no definition.
    pub fn dangling_references(&self) -> Vec<StateId> {
        let transitions = self
            .states
            .values()
            .flat_map(|s| &s.transitions)
            .flat_map(|t| t.true_state.iter().chain(t.false_state.iter()));

        let mut missing: Vec<StateId> = std::iter::once(&self.initial)
            .chain(&self.any_states)
            .chain(transitions)
            .filter(|id| !self.states.contains_key(*id))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

/// Root structure for the ai_states.ron file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateMachinesConfig {
    pub machines: HashMap<String, StateMachineConfig>,
}

/// Resource holding every AI state graph, keyed by machine name.
#[derive(Resource, Debug, Clone, Default)]
pub struct StateMachineDefinitions {
    machines: HashMap<String, StateMachineConfig>,
}

impl StateMachineDefinitions {
    pub fn new(config: StateMachinesConfig) -> Self {
        Self {
            machines: config.machines,
        }
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: StateMachinesConfig = ron::from_str(contents).map_err(|e| e.to_string())?;
        Ok(Self::new(config))
    }

    pub fn get(&self, machine: &str) -> Option<&StateMachineConfig> {
        self.machines.get(machine)
    }

    pub fn insert(&mut self, name: impl Into<String>, machine: StateMachineConfig) {
        self.machines.insert(name.into(), machine);
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems: Vec<String> = self
            .machines
            .iter()
            .flat_map(|(name, machine)| {
                machine
                    .dangling_references()
                    .into_iter()
                    .map(move |id| format!("machine '{}' references undefined state '{}'", name, id))
            })
            .collect();
        problems.sort();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Load AI state machines from a RON file
pub fn load_state_machines(path: &Path) -> Result<StateMachineDefinitions, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let definitions = StateMachineDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    definitions
        .validate()
        .map_err(|problems| format!("Invalid state machines: {}", problems.join("; ")))?;

    info!("Loaded {} AI state machines from {}", definitions.len(), path.display());
    Ok(definitions)
}
