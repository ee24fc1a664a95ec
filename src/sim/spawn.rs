//! Entity assembly.
//!
//! An [`EntityBlueprint`] lists every sub-state an entity starts with, and
//! [`spawn_entity`] builds the entity from it in one go. Nothing is looked up
//! or attached later.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::abilities::{AbilityCards, AbilityId, AbilityState, CardId};
use super::ai::StateMachine;
use super::components::{CaptureToggles, EntityKind, GameRng, SimEntity};
use super::constants::{DEFAULT_ABILITY_SLOTS, DEFAULT_HAND_SIZE};
use super::detection::{DetectionConfig, DetectionState};
use super::game::{ObstacleZone, SpawnPoint};
use super::input::{InputState, ScriptedInput};
use super::movement::{MovementConfig, MovementState};
use super::navigation::{NavigationState, PathingConfig};
use super::physics::{Collider, ColliderShape, CollisionState, LayerMask};
use super::status::{StatusConfig, StatusState};

fn default_ability_slots() -> usize {
    DEFAULT_ABILITY_SLOTS
}

fn default_hand_size() -> usize {
    DEFAULT_HAND_SIZE
}

fn default_body() -> ColliderShape {
    ColliderShape::Sphere { radius: 0.5 }
}

/// Deck setup for card-driven entities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardLoadout {
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub basic_attack: Option<AbilityId>,
    #[serde(default = "default_hand_size")]
    pub hand_size: usize,
}

/// Everything needed to spawn one simulated entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityBlueprint {
    pub name: String,
    pub kind: EntityKind,
    pub position: Vec3,
    /// Initial facing around +Y, in degrees
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default = "default_body")]
    pub body: ColliderShape,
    /// Physics layer; derived from `kind` when absent
    #[serde(default)]
    pub layer: Option<LayerMask>,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub pathing: PathingConfig,
    /// Abilities bound to Action0..Action3
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
    #[serde(default = "default_ability_slots")]
    pub ability_slots: usize,
    #[serde(default)]
    pub cards: Option<CardLoadout>,
    /// Name of the AI machine driving this entity
    #[serde(default)]
    pub state_machine: Option<String>,
    #[serde(default)]
    pub input: Option<ScriptedInput>,
    #[serde(default)]
    pub capture: CaptureToggles,
}

impl EntityBlueprint {
    pub fn new(name: impl Into<String>, kind: EntityKind, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            yaw_degrees: 0.0,
            body: default_body(),
            layer: None,
            movement: MovementConfig::default(),
            status: StatusConfig::default(),
            detection: DetectionConfig::default(),
            pathing: PathingConfig::default(),
            abilities: Vec::new(),
            ability_slots: DEFAULT_ABILITY_SLOTS,
            cards: None,
            state_machine: None,
            input: None,
            capture: CaptureToggles::default(),
        }
    }

    pub fn layer(&self) -> LayerMask {
        self.layer.unwrap_or(match self.kind {
            EntityKind::Player => LayerMask::PLAYER,
            EntityKind::Enemy => LayerMask::ENEMY,
            EntityKind::None => LayerMask::NONE,
        })
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.yaw_degrees.to_radians()))
    }

    /// The components every entity carries.
    pub fn core_bundle(&self) -> impl Bundle {
        let sim_entity = SimEntity {
            name: self.name.clone(),
            kind: self.kind,
            capture: self.capture,
        };
        (
            (
                sim_entity,
                self.transform(),
                Collider {
                    shape: self.body,
                    layer: self.layer(),
                },
                CollisionState::default(),
                InputState::default(),
                SpawnPoint(self.transform()),
            ),
            (
                MovementState::new(&self.movement),
                self.movement.clone(),
                StatusState::new(self.status),
                DetectionState::new(self.detection),
                NavigationState::new(self.pathing.clone()),
                AbilityState::new(self.abilities.clone(), self.ability_slots),
            ),
        )
    }
}

/// Spawn `blueprint` into `world`, dealing its opening hand from [`GameRng`].
pub fn spawn_entity(world: &mut World, blueprint: &EntityBlueprint) -> Entity {
    let cards = blueprint.cards.as_ref().map(|loadout| {
        let deal = |rng: &mut GameRng| {
            AbilityCards::new(
                loadout.cards.clone(),
                loadout.basic_attack.clone(),
                loadout.hand_size,
                rng.rng_mut(),
            )
        };
        match world.get_resource_mut::<GameRng>() {
            Some(mut rng) => deal(&mut *rng),
            None => deal(&mut GameRng::from_entropy()),
        }
    });

    let mut entity = world.spawn(blueprint.core_bundle());
    if let Some(cards) = cards {
        entity.insert(cards);
    }
    if let Some(machine) = &blueprint.state_machine {
        entity.insert(StateMachine::new(machine.clone()));
    }
    if let Some(script) = &blueprint.input {
        entity.insert(script.clone());
    }

    let id = entity.id();
    debug!("Spawned {} ({:?}) as {:?}", blueprint.name, blueprint.kind, id);
    id
}

/// Spawn a static terrain box that blocks line of sight. With a `stop_mask`
/// it also stops entities on those layers that walk into it.
pub fn spawn_obstacle(world: &mut World, center: Vec3, half_extents: Vec3, stop_mask: Option<LayerMask>) -> Entity {
    let mut obstacle = world.spawn((
        Transform::from_translation(center),
        Collider {
            shape: ColliderShape::Box { half_extents },
            layer: LayerMask::TERRAIN,
        },
    ));
    if let Some(mask) = stop_mask {
        obstacle.insert(ObstacleZone::new(half_extents, mask));
    }
    obstacle.id()
}
