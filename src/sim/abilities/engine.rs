//! Per-entity ability engine: picks abilities from input, runs them in
//! slots, and tracks cooldowns.

use bevy::prelude::*;
use rand::Rng;
use smallvec::SmallVec;

use super::cards::AbilityCards;
use super::config::{AbilityDefinitions, ActivationKind, CooldownKind};
use super::logic::{AbilityContext, AbilityLogic, HitRecord};
use super::AbilityId;
use crate::sim::constants::DEFAULT_ABILITY_SLOTS;
use crate::sim::input::{InputButton, InputState};
use crate::sim::movement::MovementInfo;
use crate::sim::physics::PhysicsQueries;

/// An ability currently running in a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveAbility {
    pub ability: AbilityId,
    /// Button that triggered it, read back for HELD and TOGGLE release
    pub input: InputButton,
    pub slot: usize,
    pub activated_tick: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbilityCooldown {
    pub ability: AbilityId,
    pub kind: CooldownKind,
    pub ends_at: f32,
}

impl AbilityCooldown {
    /// TOGGLE and INFINITE cooldowns only end through [`AbilityState::clear_cooldown`].
    pub fn is_active(&self, now: f32) -> bool {
        match self.kind {
            CooldownKind::Timed => now < self.ends_at,
            CooldownKind::Toggle | CooldownKind::Infinite => true,
        }
    }
}

/// Read-only snapshot for AI decisions and observers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityStateInfo {
    pub is_using_ability: bool,
    pub active: SmallVec<[AbilityId; 2]>,
}

#[derive(Component, Clone, Debug)]
pub struct AbilityState {
    /// Abilities bound to Action0..Action3, in order
    pub loadout: Vec<AbilityId>,
    slots: Vec<AbilityLogic>,
    active: Vec<ActiveAbility>,
    cooldowns: Vec<AbilityCooldown>,
    info: AbilityStateInfo,
}

impl Default for AbilityState {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_ABILITY_SLOTS)
    }
}

impl AbilityState {
    pub fn new(loadout: Vec<AbilityId>, slot_count: usize) -> Self {
        Self {
            loadout,
            slots: vec![AbilityLogic::default(); slot_count.max(1)],
            active: Vec::new(),
            cooldowns: Vec::new(),
            info: AbilityStateInfo::default(),
        }
    }

    /// Read this tick's input and start whatever it asks for.
    ///
    /// Entities with [`AbilityCards`] pick from their hand; the rest use the
    /// fixed loadout. Returns the ability that started, if any.
    pub fn perform_abilities<R: Rng + ?Sized>(
        &mut self,
        definitions: &AbilityDefinitions,
        ctx: &AbilityContext,
        cards: Option<&mut AbilityCards>,
        rng: &mut R,
    ) -> Option<AbilityId> {
        match cards {
            Some(cards) => self.perform_card_abilities(definitions, ctx, cards, rng),
            None => self.perform_slot_abilities(definitions, ctx),
        }
    }

    fn perform_slot_abilities(&mut self, definitions: &AbilityDefinitions, ctx: &AbilityContext) -> Option<AbilityId> {
        let (index, button) = InputButton::ACTIONS
            .iter()
            .enumerate()
            .find(|(_, button)| ctx.input.is_held(**button))?;
        let ability = self.loadout.get(index)?.clone();

        self.try_activate(definitions, &ability, *button, ctx)
            .then_some(ability)
    }

    fn perform_card_abilities<R: Rng + ?Sized>(
        &mut self,
        definitions: &AbilityDefinitions,
        ctx: &AbilityContext,
        cards: &mut AbilityCards,
        rng: &mut R,
    ) -> Option<AbilityId> {
        let input = ctx.input;
        let shifting = [InputButton::ShiftActionLeft, InputButton::ShiftActionRight]
            .iter()
            .any(|b| input.is_held(*b) || input.was_released(*b));
        if shifting {
            if input.was_released(InputButton::ShiftActionLeft) {
                cards.shift_left();
            }
            if input.was_released(InputButton::ShiftActionRight) {
                cards.shift_right();
            }
            return None;
        }

        if !self.active.is_empty() {
            return None;
        }

        if input.is_held(InputButton::BasicAction) {
            let ability = cards.basic_attack.clone()?;
            return self
                .try_activate(definitions, &ability, InputButton::BasicAction, ctx)
                .then_some(ability);
        }

        let button = InputButton::ACTIONS.into_iter().find(|b| input.is_held(*b))?;
        let card = cards.next_card(rng)?;
        let Some(ability) = definitions.ability_for_card(&card).cloned() else {
            warn!("Card {} has no ability definition", card);
            return None;
        };
        if !self.try_activate(definitions, &ability, button, ctx) {
            return None;
        }
        cards.discard_card(&card, rng);
        Some(ability)
    }

    /// Start `ability` in a free slot if it is defined, off cooldown and not already running.
    pub fn try_activate(
        &mut self,
        definitions: &AbilityDefinitions,
        ability: &AbilityId,
        input: InputButton,
        ctx: &AbilityContext,
    ) -> bool {
        if !self.is_ability_ready(ability, ctx.now) {
            return false;
        }
        let Some(config) = definitions.get(ability) else {
            warn!("Unknown ability {}", ability);
            return false;
        };
        let Some(slot) = self.free_slot() else {
            debug!("No free slot for {}", ability);
            return false;
        };

        let logic = &mut self.slots[slot];
        logic.initialize(ability);
        logic.activate(config, ctx);
        self.active.push(ActiveAbility {
            ability: ability.clone(),
            input,
            slot,
            activated_tick: ctx.tick,
        });
        self.refresh_info();
        true
    }

    /// False while the ability is cooling down or still running.
    pub fn is_ability_ready(&self, ability: &AbilityId, now: f32) -> bool {
        !self.is_on_cooldown(ability, now) && !self.is_active(ability)
    }

    pub fn is_on_cooldown(&self, ability: &AbilityId, now: f32) -> bool {
        self.cooldowns
            .iter()
            .any(|c| &c.ability == ability && c.is_active(now))
    }

    pub fn is_active(&self, ability: &AbilityId) -> bool {
        self.active.iter().any(|a| &a.ability == ability)
    }

    /// Run every active slot for one tick, retire finished abilities onto
    /// cooldown and drop expired timed cooldowns.
    pub fn manage_abilities(
        &mut self,
        definitions: &AbilityDefinitions,
        ctx: &AbilityContext,
        physics: &dyn PhysicsQueries,
    ) -> Vec<HitRecord> {
        let mut hits = Vec::new();

        for entry in &self.active {
            let logic = &mut self.slots[entry.slot];
            let Some(config) = definitions.get(&entry.ability) else {
                logic.complete(ctx);
                continue;
            };
            let held = match config.activation {
                ActivationKind::Toggle => ctx.input.was_pressed(entry.input) && ctx.tick != entry.activated_tick,
                ActivationKind::Held | ActivationKind::Trigger => ctx.input.is_held(entry.input),
            };
            hits.extend(logic.manage(config, ctx, held, physics));
        }

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|entry| !self.slots[entry.slot].is_active());
        self.active = running;

        for entry in finished {
            let cooldown = definitions
                .get(&entry.ability)
                .map(|config| config.cooldown)
                .unwrap_or_default();
            debug!("{} finished, cooling down for {:.2}s", entry.ability, cooldown.time);
            self.cooldowns.push(AbilityCooldown {
                ability: entry.ability,
                kind: cooldown.kind,
                ends_at: ctx.now + cooldown.time,
            });
        }

        self.cooldowns.retain(|c| c.is_active(ctx.now));
        self.refresh_info();
        hits
    }

    /// Lift a cooldown early. The only way TOGGLE and INFINITE cooldowns end.
    pub fn clear_cooldown(&mut self, ability: &AbilityId) -> bool {
        let before = self.cooldowns.len();
        self.cooldowns.retain(|c| &c.ability != ability);
        before != self.cooldowns.len()
    }

    /// First slot not running an ability.
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.is_active())
    }

    /// Movement requested by the most recently started ability that is moving.
    pub fn movement(&self) -> MovementInfo {
        self.active
            .iter()
            .rev()
            .map(|entry| self.slots[entry.slot].movement_info())
            .find(|info| !info.is_none())
            .unwrap_or(MovementInfo::NONE)
    }

    fn refresh_info(&mut self) {
        self.info = AbilityStateInfo {
            is_using_ability: !self.active.is_empty(),
            active: self.active.iter().map(|a| a.ability.clone()).collect(),
        };
    }

    pub fn info(&self) -> &AbilityStateInfo {
        &self.info
    }

    pub fn active_abilities(&self) -> &[ActiveAbility] {
        &self.active
    }

    pub fn cooldowns(&self) -> &[AbilityCooldown] {
        &self.cooldowns
    }

    pub fn slot(&self, index: usize) -> Option<&AbilityLogic> {
        self.slots.get(index)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
