//! Per-tick input snapshots.
//!
//! Raw device polling is not part of the simulation. Something outside the
//! core (a device layer, a script, the AI actions) writes button and axis
//! values into an entity's [`InputState`], and the ability engine and motion
//! resolver read them back.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::clock::SimClock;

/// Named buttons the simulation understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputButton {
    Action0,
    Action1,
    Action2,
    Action3,
    BasicAction,
    ShiftActionLeft,
    ShiftActionRight,
    Start,
}

impl InputButton {
    /// The ability action buttons in slot order.
    pub const ACTIONS: [InputButton; 4] = [
        InputButton::Action0,
        InputButton::Action1,
        InputButton::Action2,
        InputButton::Action3,
    ];

    /// Every button, used when a feeder rewrites the whole snapshot.
    pub fn all() -> [InputButton; 8] {
        [
            InputButton::Action0,
            InputButton::Action1,
            InputButton::Action2,
            InputButton::Action3,
            InputButton::BasicAction,
            InputButton::ShiftActionLeft,
            InputButton::ShiftActionRight,
            InputButton::Start,
        ]
    }

    /// Action button for an ability slot, if there is one.
    pub fn action(slot: usize) -> Option<InputButton> {
        Self::ACTIONS.get(slot).copied()
    }
}

/// Named analog axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAxis {
    /// Strafe, +1 is right (+X)
    X,
    /// Stick forward/back, +1 is forward (-Z)
    Y,
    /// Vertical, +1 is up
    Z,
}

/// Edge-tracked state of one button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Currently down
    pub held: bool,
    /// Went down this tick
    pub pressed: bool,
    /// Went up this tick
    pub released: bool,
}

/// Input snapshot for one entity.
#[derive(Component, Clone, Debug, Default)]
pub struct InputState {
    buttons: HashMap<InputButton, ButtonState>,
    axes: HashMap<InputAxis, f32>,
}

impl InputState {
    /// Clear the pressed/released edges. Call once before writing a new tick.
    pub fn begin_tick(&mut self) {
        for state in self.buttons.values_mut() {
            state.pressed = false;
            state.released = false;
        }
    }

    /// Set whether `button` is down, recording press/release edges.
    pub fn set_button(&mut self, button: InputButton, down: bool) {
        let state = self.buttons.entry(button).or_default();
        state.pressed = down && !state.held;
        state.released = !down && state.held;
        state.held = down;
    }

    /// Release every held button.
    pub fn release_all(&mut self) {
        for state in self.buttons.values_mut() {
            if state.held {
                state.held = false;
                state.pressed = false;
                state.released = true;
            }
        }
    }

    pub fn set_axis(&mut self, axis: InputAxis, value: f32) {
        self.axes.insert(axis, value);
    }

    pub fn button(&self, button: InputButton) -> ButtonState {
        self.buttons.get(&button).copied().unwrap_or_default()
    }

    pub fn is_held(&self, button: InputButton) -> bool {
        self.button(button).held
    }

    pub fn was_pressed(&self, button: InputButton) -> bool {
        self.button(button).pressed
    }

    pub fn was_released(&self, button: InputButton) -> bool {
        self.button(button).released
    }

    pub fn axis(&self, axis: InputAxis) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    /// Raw movement intent in world axes: X strafes, Y pushes toward -Z, Z lifts.
    pub fn movement_vector(&self) -> Vec3 {
        Vec3::new(
            self.axis(InputAxis::X),
            self.axis(InputAxis::Z),
            -self.axis(InputAxis::Y),
        )
    }
}

/// One timed entry of a scripted input track.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputStep {
    /// Simulation time the step starts, in seconds
    pub start: f32,
    /// Simulation time the step ends (exclusive)
    pub end: f32,
    /// Buttons held for the whole step
    pub buttons: Vec<InputButton>,
    /// Strafe axis value while active
    pub x: f32,
    /// Forward axis value while active
    pub y: f32,
}

impl InputStep {
    pub fn is_active(&self, now: f32) -> bool {
        now >= self.start && now < self.end
    }
}

/// Drives an entity's [`InputState`] from a fixed timeline.
#[derive(Component, Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub steps: Vec<InputStep>,
}

impl ScriptedInput {
    /// Write the snapshot for simulation time `now`. Overlapping steps add their axes.
    pub fn apply(&self, now: f32, input: &mut InputState) {
        input.begin_tick();

        let active: Vec<&InputStep> = self.steps.iter().filter(|s| s.is_active(now)).collect();
        for button in InputButton::all() {
            let down = active.iter().any(|s| s.buttons.contains(&button));
            input.set_button(button, down);
        }

        let x: f32 = active.iter().map(|s| s.x).sum();
        let y: f32 = active.iter().map(|s| s.y).sum();
        input.set_axis(InputAxis::X, x);
        input.set_axis(InputAxis::Y, y);
    }
}

/// Feed scripted input tracks into their entities.
pub fn apply_scripted_input(clock: Res<SimClock>, mut query: Query<(&ScriptedInput, &mut InputState)>) {
    for (script, mut input) in query.iter_mut() {
        script.apply(clock.elapsed, &mut input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edges() {
        let mut input = InputState::default();
        input.set_button(InputButton::Action0, true);
        assert!(input.was_pressed(InputButton::Action0));
        assert!(input.is_held(InputButton::Action0));

        input.begin_tick();
        input.set_button(InputButton::Action0, true);
        assert!(!input.was_pressed(InputButton::Action0), "Holding is not a new press");

        input.begin_tick();
        input.set_button(InputButton::Action0, false);
        assert!(input.was_released(InputButton::Action0));
        assert!(!input.is_held(InputButton::Action0));
    }

    #[test]
    fn test_scripted_input_windows() {
        let script = ScriptedInput {
            steps: vec![InputStep {
                start: 1.0,
                end: 2.0,
                buttons: vec![InputButton::BasicAction],
                x: 0.0,
                y: 1.0,
            }],
        };
        let mut input = InputState::default();

        script.apply(0.5, &mut input);
        assert!(!input.is_held(InputButton::BasicAction));

        script.apply(1.5, &mut input);
        assert!(input.was_pressed(InputButton::BasicAction));
        assert_eq!(input.movement_vector(), Vec3::new(0.0, 0.0, -1.0));

        script.apply(2.0, &mut input);
        assert!(input.was_released(InputButton::BasicAction));
        assert_eq!(input.movement_vector(), Vec3::ZERO);
    }
}
