//! AI State Machine
//!
//! Each AI entity carries a [`StateMachine`] naming a graph in
//! [`StateMachineDefinitions`]. Per tick, any-state interrupts are checked
//! first; if none fires, the current state runs its actions and then walks its
//! transitions in order.

use bevy::prelude::*;
use smallvec::SmallVec;

pub mod config;
pub mod strategies;

pub use config::{
    load_state_machines, StateConfig, StateId, StateMachineConfig, StateMachineDefinitions, TransitionConfig,
};
pub use strategies::{ActionKind, AiContext, DecisionKind};

use crate::combat::events::StateChangedEvent;
use crate::sim::abilities::AbilityState;
use crate::sim::components::SimEntity;
use crate::sim::detection::DetectionState;
use crate::sim::input::{InputButton, InputState};
use crate::sim::navigation::NavigationState;
use crate::sim::status::StatusState;

/// A state switch made during one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    pub from: Option<StateId>,
    pub to: StateId,
}

#[derive(Component, Clone, Debug)]
pub struct StateMachine {
    /// Name of the graph in [`StateMachineDefinitions`]
    pub machine: String,
    pub ai_active: bool,
    current: Option<StateId>,
}

impl StateMachine {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            ai_active: true,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&StateId> {
        self.current.as_ref()
    }

    pub fn is_in(&self, state: &str) -> bool {
        self.current.as_ref().is_some_and(|s| s.0 == state)
    }

    /// Run one tick of the graph. Returns every state switch it made.
    pub fn manage_states(&mut self, machine: &StateMachineConfig, ctx: &mut AiContext) -> SmallVec<[StateChange; 2]> {
        let mut changes = SmallVec::new();
        if !self.ai_active {
            return changes;
        }

        if self.current.is_none() {
            let initial = machine.initial.clone();
            if let Some(change) = self.transition_to(machine, Some(&initial), ctx) {
                changes.push(change);
            }
        }

        for any_state in &machine.any_states {
            if self.current.as_ref() == Some(any_state) {
                continue;
            }
            let Some(state) = machine.state(any_state) else {
                continue;
            };
            if let Some(fired) = state.transitions.iter().find(|t| t.decision.decide(ctx)) {
                // Interrupts swap state and skip normal processing for this tick
                if let Some(change) = self.transition_to(machine, fired.true_state.as_ref(), ctx) {
                    changes.push(change);
                }
                return changes;
            }
        }

        let Some(current) = self.current.clone() else {
            return changes;
        };
        let Some(state) = machine.state(&current) else {
            error!("State '{}' is not defined in machine '{}'", current, self.machine);
            return changes;
        };

        for action in &state.actions {
            action.act(ctx);
        }

        for transition in &state.transitions {
            let target = if transition.decision.decide(ctx) {
                transition.true_state.as_ref()
            } else {
                transition.false_state.as_ref()
            };
            let Some(next) = target else {
                continue;
            };
            // Re-entering the current state restarts its actions but is not a change
            if Some(next) == self.current.as_ref() {
                self.reenter(machine, next, ctx);
            } else if let Some(change) = self.transition_to(machine, Some(next), ctx) {
                changes.push(change);
            }
        }

        changes
    }

    fn reenter(&self, machine: &StateMachineConfig, current: &StateId, ctx: &mut AiContext) {
        if let Some(state) = machine.state(current) {
            for action in &state.actions {
                action.initialize(ctx);
            }
        }
    }

    /// Switch to `next` and initialise its actions. A missing target is logged and ignored.
    pub fn transition_to(
        &mut self,
        machine: &StateMachineConfig,
        next: Option<&StateId>,
        ctx: &mut AiContext,
    ) -> Option<StateChange> {
        let Some(next) = next else {
            error!("Transition in machine '{}' has no target state", self.machine);
            return None;
        };
        let Some(state) = machine.state(next) else {
            error!("State '{}' is not defined in machine '{}'", next, self.machine);
            return None;
        };

        for action in &state.actions {
            action.initialize(ctx);
        }
        let from = self.current.replace(next.clone());
        Some(StateChange {
            from,
            to: next.clone(),
        })
    }
}

/// Tick every active AI and write the buttons it holds into its input.
#[allow(clippy::type_complexity)]
pub fn run_state_machines(
    definitions: Res<StateMachineDefinitions>,
    mut state_events: EventWriter<StateChangedEvent>,
    mut query: Query<(
        Entity,
        &SimEntity,
        &Transform,
        &StatusState,
        &AbilityState,
        &DetectionState,
        &mut NavigationState,
        &mut InputState,
        &mut StateMachine,
    )>,
) {
    for (entity, sim_entity, transform, status, abilities, detection, mut navigation, mut input, mut machine) in
        query.iter_mut()
    {
        if !sim_entity.capture.states {
            continue;
        }
        let Some(graph) = definitions.get(&machine.machine) else {
            warn!("{} uses unknown AI machine '{}'", sim_entity.name, machine.machine);
            continue;
        };

        let mut ctx = AiContext {
            position: transform.translation,
            status: status.info(),
            abilities: abilities.info(),
            detection: detection.info(),
            navigation: &mut *navigation,
            buttons: SmallVec::new(),
        };
        let changes = machine.manage_states(graph, &mut ctx);

        input.begin_tick();
        for button in InputButton::all() {
            input.set_button(button, ctx.buttons.contains(&button));
        }

        for change in changes {
            info!(
                "{} state {} -> {}",
                sim_entity.name,
                change.from.as_ref().map(|s| s.0.as_str()).unwrap_or("<none>"),
                change.to
            );
            state_events.send(StateChangedEvent {
                entity,
                from: change.from,
                to: change.to,
            });
        }
    }
}
