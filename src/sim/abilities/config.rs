//! Data-Driven Ability Configuration
//!
//! Abilities and the cards that reference them are defined in
//! `assets/config/abilities.ron` and loaded once into [`AbilityDefinitions`].
//! Live per-entity state only ever refers to them by [`AbilityId`] / [`CardId`].
//!
//! ## Usage
//! ```ignore
//! fn my_system(abilities: Res<AbilityDefinitions>) {
//!     let dash = abilities.get(&AbilityId::new("dash")).unwrap();
//!     println!("Dash has {} events", dash.events.len());
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::sim::curve::EasingCurve;
use crate::sim::movement::MovementSpace;
use crate::sim::physics::LayerMask;
use crate::sim::status::DamageInfo;

/// Stable handle of an ability definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable handle of a card definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a cooldown ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownKind {
    /// Expires on its own after `time` seconds
    #[default]
    Timed,
    /// Stays until cleared externally
    Toggle,
    /// Never expires unless cleared externally
    Infinite,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub kind: CooldownKind,
    /// Seconds after completion before the ability can be used again
    pub time: f32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            kind: CooldownKind::Timed,
            time: 1.0,
        }
    }
}

/// How the triggering button interacts with a running ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationKind {
    /// Runs on its timers alone
    #[default]
    Trigger,
    /// Letting go of the button completes the current event
    Held,
    /// Pressing the button again completes the current event
    Toggle,
}

/// Movement phase of an event: pushes the caster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementPhase {
    pub duration: f32,
    pub infinite: bool,
    pub direction: Vec3,
    pub curve: EasingCurve,
    /// Distance covered over `duration` (per second when the duration is 0)
    pub distance: f32,
    pub input_modifier: f32,
    pub space: MovementSpace,
    pub use_gravity: bool,
    pub use_forward: bool,
}

/// How the damage collider moves during the interaction phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMotion {
    /// Stays where the event placed it
    #[default]
    None,
    /// Travels along `direction` at `distance / duration`
    Velocity,
    /// Sits at `direction * distance * curve(t)` from its anchor
    Position,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionMovement {
    pub motion: InteractionMotion,
    pub direction: Vec3,
    pub distance: f32,
    pub curve: EasingCurve,
    pub space: MovementSpace,
    /// Collider start relative to the caster, in caster space
    pub start_offset: Vec3,
    /// Snap the collider back onto the caster when the event starts
    pub reset_to_base_position: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    #[default]
    None,
    Box {
        half_extents: Vec3,
    },
    Sphere {
        radius: f32,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitCollider {
    pub shape: HitShape,
    pub hit_mask: LayerMask,
}

/// Interaction phase of an event: sweeps a damage collider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionPhase {
    pub duration: f32,
    pub infinite: bool,
    pub movement: InteractionMovement,
    pub collider: HitCollider,
    pub damage: DamageInfo,
}

/// Effect phase of an event: raw values for effect hooks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectPhase {
    pub duration: f32,
    pub infinite: bool,
    pub damage_value: f32,
    pub effect_value: f32,
    pub effect_duration: f32,
}

/// One step of an ability timeline. The three phases run concurrently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityEvent {
    pub movement: MovementPhase,
    pub interaction: InteractionPhase,
    pub effect: EffectPhase,
}

impl AbilityEvent {
    /// Time until the slowest phase finishes.
    pub fn longest_phase(&self) -> f32 {
        self.movement
            .duration
            .max(self.interaction.duration)
            .max(self.effect.duration)
    }

    pub fn has_infinite_phase(&self) -> bool {
        self.movement.infinite || self.interaction.infinite || self.effect.infinite
    }
}

/// Complete ability configuration loaded from RON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Display name of the ability
    pub name: String,
    #[serde(default)]
    pub activation: ActivationKind,
    #[serde(default)]
    pub cooldown: CooldownConfig,
    pub events: Vec<AbilityEvent>,
}

impl AbilityConfig {
    /// Sum of each event's longest phase.
    pub fn total_event_time(&self) -> f32 {
        self.events.iter().map(AbilityEvent::longest_phase).sum()
    }

    /// True when the timeline outlasts a timed cooldown.
    pub fn exceeds_cooldown(&self) -> bool {
        self.cooldown.kind == CooldownKind::Timed && self.total_event_time() > self.cooldown.time
    }
}

/// A card in the player's deck, pointing at the ability it casts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub name: String,
    pub ability: AbilityId,
}

/// Root structure for the abilities.ron file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AbilitiesConfig {
    pub abilities: HashMap<AbilityId, AbilityConfig>,
    #[serde(default)]
    pub cards: HashMap<CardId, CardConfig>,
}

/// Resource containing all ability and card definitions.
///
/// Access via `Res<AbilityDefinitions>` in systems.
#[derive(Resource, Debug, Clone, Default)]
pub struct AbilityDefinitions {
    definitions: HashMap<AbilityId, AbilityConfig>,
    cards: HashMap<CardId, CardConfig>,
}

impl AbilityDefinitions {
    /// Create from a loaded config
    pub fn new(config: AbilitiesConfig) -> Self {
        Self {
            definitions: config.abilities,
            cards: config.cards,
        }
    }

    /// Parse a RON document
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: AbilitiesConfig = ron::from_str(contents).map_err(|e| e.to_string())?;
        Ok(Self::new(config))
    }

    /// Get the configuration for an ability
    pub fn get(&self, ability: &AbilityId) -> Option<&AbilityConfig> {
        self.definitions.get(ability)
    }

    pub fn card(&self, card: &CardId) -> Option<&CardConfig> {
        self.cards.get(card)
    }

    /// The ability a card casts
    pub fn ability_for_card(&self, card: &CardId) -> Option<&AbilityId> {
        self.cards.get(card).map(|c| &c.ability)
    }

    pub fn insert(&mut self, id: AbilityId, config: AbilityConfig) {
        self.definitions.insert(id, config);
    }

    pub fn insert_card(&mut self, id: CardId, config: CardConfig) {
        self.cards.insert(id, config);
    }

    pub fn ability_ids(&self) -> impl Iterator<Item = &AbilityId> {
        self.definitions.keys()
    }

    pub fn card_ids(&self) -> impl Iterator<Item = &CardId> {
        self.cards.keys()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Check for definitions the engine cannot run.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for (id, config) in &self.definitions {
            if config.events.is_empty() {
                problems.push(format!("ability '{}' has no events", id));
            }
            if config.cooldown.time < 0.0 {
                problems.push(format!("ability '{}' has a negative cooldown", id));
            }
            if config.activation == ActivationKind::Trigger
                && config.events.iter().any(AbilityEvent::has_infinite_phase)
            {
                problems.push(format!(
                    "ability '{}' has an infinite phase but Trigger activation, it would never finish",
                    id
                ));
            }
        }

        for (card, config) in &self.cards {
            if !self.definitions.contains_key(&config.ability) {
                problems.push(format!("card '{}' casts unknown ability '{}'", card, config.ability));
            }
        }

        problems.sort();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Abilities whose timeline is longer than their cooldown.
    pub fn timing_warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .definitions
            .iter()
            .filter(|(_, config)| config.exceeds_cooldown())
            .map(|(id, config)| {
                format!(
                    "ability '{}' runs for {:.2}s but its cooldown is {:.2}s",
                    id,
                    config.total_event_time(),
                    config.cooldown.time
                )
            })
            .collect();
        warnings.sort();
        warnings
    }
}

/// Load ability definitions from a RON file
pub fn load_ability_definitions(path: &Path) -> Result<AbilityDefinitions, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let definitions = AbilityDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    definitions
        .validate()
        .map_err(|problems| format!("Invalid ability definitions: {}", problems.join("; ")))?;

    for warning in definitions.timing_warnings() {
        warn!("{}", warning);
    }

    info!(
        "Loaded {} ability definitions and {} cards from {}",
        definitions.definitions.len(),
        definitions.cards.len(),
        path.display()
    );

    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(movement: f32, interaction: f32, effect: f32) -> AbilityEvent {
        AbilityEvent {
            movement: MovementPhase {
                duration: movement,
                ..default()
            },
            interaction: InteractionPhase {
                duration: interaction,
                ..default()
            },
            effect: EffectPhase {
                duration: effect,
                ..default()
            },
        }
    }

    #[test]
    fn test_total_event_time_uses_longest_phase() {
        let config = AbilityConfig {
            name: "Combo".to_string(),
            activation: ActivationKind::Trigger,
            cooldown: CooldownConfig {
                kind: CooldownKind::Timed,
                time: 1.0,
            },
            events: vec![event(0.5, 0.2, 0.0), event(0.1, 0.7, 0.3)],
        };

        assert!((config.total_event_time() - 1.2).abs() < 1e-6);
        assert!(config.exceeds_cooldown());
    }

    #[test]
    fn test_validate_catches_dangling_cards_and_endless_triggers() {
        let mut definitions = AbilityDefinitions::default();
        let mut endless = event(1.0, 0.0, 0.0);
        endless.movement.infinite = true;
        definitions.insert(
            AbilityId::new("spin"),
            AbilityConfig {
                name: "Spin".to_string(),
                activation: ActivationKind::Trigger,
                cooldown: CooldownConfig::default(),
                events: vec![endless],
            },
        );
        definitions.insert_card(
            CardId::new("ghost"),
            CardConfig {
                name: "Ghost".to_string(),
                ability: AbilityId::new("missing"),
            },
        );

        let problems = definitions.validate().unwrap_err();
        assert_eq!(problems.len(), 2, "got {:?}", problems);
    }

    #[test]
    fn test_parse_minimal_ron() {
        let ron = r#"(
            abilities: {
                "jab": (
                    name: "Jab",
                    cooldown: (time: 0.5),
                    events: [(
                        interaction: (
                            duration: 0.1,
                            collider: (shape: Sphere(radius: 1.0), hit_mask: 4),
                            damage: (value: 10.0, damage_type: Physical),
                        ),
                    )],
                ),
            },
            cards: {
                "jab_card": (name: "Jab", ability: "jab"),
            },
        )"#;

        let definitions = AbilityDefinitions::from_ron_str(ron).expect("valid RON");
        let jab = definitions.get(&AbilityId::new("jab")).expect("jab defined");
        assert_eq!(jab.activation, ActivationKind::Trigger);
        assert_eq!(jab.events[0].interaction.collider.hit_mask, LayerMask::ENEMY);
        assert_eq!(
            definitions.ability_for_card(&CardId::new("jab_card")),
            Some(&AbilityId::new("jab"))
        );
        assert!(definitions.validate().is_ok());
    }
}
