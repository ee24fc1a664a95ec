//! Runtime of one ability slot.
//!
//! An [`AbilityLogic`] plays a single ability's event timeline. Each event has
//! three phases (movement, interaction, effect) that run side by side; the
//! event is done once all three report completion, then the slot advances to
//! the next event or finishes the ability.

use bevy::prelude::*;

use super::config::{
    AbilityConfig, AbilityEvent, ActivationKind, EffectPhase, HitShape, InteractionMotion, InteractionMovement,
    InteractionPhase, MovementPhase,
};
use super::AbilityId;
use crate::sim::curve::time_ratio;
use crate::sim::detection::DetectionInfo;
use crate::sim::input::InputState;
use crate::sim::movement::{MovementInfo, MovementSource, MovementSpace};
use crate::sim::physics::{CollisionState, OverlapHits, PhysicsQueries};
use crate::sim::status::DamageInfo;

/// What an ability needs to know about its caster for one tick.
#[derive(Clone, Copy)]
pub struct AbilityContext<'a> {
    pub entity: Entity,
    pub now: f32,
    pub dt: f32,
    pub tick: u64,
    pub transform: &'a Transform,
    pub collision: &'a CollisionState,
    pub detection: &'a DetectionInfo,
    pub input: &'a InputState,
}

/// A target struck by an interaction collider.
#[derive(Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub ability: AbilityId,
    pub target: Entity,
    pub hit_position: Vec3,
    pub damage: DamageInfo,
}

/// Deadline bookkeeping for one phase of the current event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PhaseTimer {
    start: f32,
    deadline: f32,
    infinite: bool,
    completed: bool,
}

impl PhaseTimer {
    /// Zero-length finite phases are complete the moment they are imported.
    fn import(duration: f32, infinite: bool, now: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            start: now,
            deadline: now + duration,
            infinite,
            completed: !infinite && duration <= 0.0,
        }
    }

    fn is_running(&self, now: f32) -> bool {
        self.infinite || now < self.deadline
    }

    fn duration(&self) -> f32 {
        self.deadline - self.start
    }

    fn ratio(&self, now: f32) -> f32 {
        time_ratio(now, self.start, self.deadline)
    }

    /// Speed that covers `distance` over the phase, or per second when it has no length.
    fn speed_for(&self, distance: f32) -> f32 {
        let duration = self.duration();
        if duration > f32::EPSILON {
            distance / duration
        } else {
            distance
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AbilityLogic {
    ability: Option<AbilityId>,
    event_index: usize,
    active: bool,
    complete: bool,
    movement_timer: PhaseTimer,
    interaction_timer: PhaseTimer,
    effect_timer: PhaseTimer,
    movement: MovementInfo,
    /// Collider offset from the caster origin when idle
    pub base_offset: Vec3,
    collider_point: Vec3,
    collider_anchor: Vec3,
    pending_hits: Vec<HitRecord>,
    struck: Vec<Entity>,
}

impl AbilityLogic {
    /// Bind the slot to an ability, resetting everything from the previous one.
    pub fn initialize(&mut self, ability: &AbilityId) {
        *self = Self {
            ability: Some(ability.clone()),
            base_offset: self.base_offset,
            collider_point: self.collider_point,
            ..default()
        };
    }

    /// Start the timeline at event 0.
    pub fn activate(&mut self, config: &AbilityConfig, ctx: &AbilityContext) {
        if self.active {
            return;
        }
        self.active = true;
        self.complete = false;
        self.collider_point = ctx.transform.transform_point(self.base_offset);
        self.import_event(config, 0, ctx);
    }

    /// Advance the slot one tick and return whatever the interaction collider hit.
    ///
    /// `held` is the button flag for the ability's activation kind: whether the
    /// button is still down for HELD, whether it was pressed again for TOGGLE.
    pub fn manage(
        &mut self,
        config: &AbilityConfig,
        ctx: &AbilityContext,
        held: bool,
        physics: &dyn PhysicsQueries,
    ) -> Vec<HitRecord> {
        if !self.active {
            return Vec::new();
        }

        if self.actions_completed() {
            self.cycle_to_next_event(config, ctx);
            return Vec::new();
        }

        let Some(event) = config.events.get(self.event_index) else {
            self.complete(ctx);
            return Vec::new();
        };

        let release = match config.activation {
            ActivationKind::Trigger => false,
            ActivationKind::Held => !held,
            ActivationKind::Toggle => held,
        };
        if release {
            self.force_complete_event();
            return Vec::new();
        }

        if !self.movement_timer.completed {
            self.manage_movement(&event.movement, ctx);
        }
        if !self.interaction_timer.completed {
            self.manage_interaction(&event.interaction, ctx, physics);
        }
        if !self.effect_timer.completed {
            self.manage_effect(&event.effect, ctx);
        }

        std::mem::take(&mut self.pending_hits)
    }

    /// Load the phases of event `index` against the current clock.
    pub fn import_event(&mut self, config: &AbilityConfig, index: usize, ctx: &AbilityContext) {
        let Some(event) = config.events.get(index) else {
            return;
        };
        self.event_index = index;
        self.movement = MovementInfo::NONE;
        self.struck.clear();
        self.pending_hits.clear();

        let AbilityEvent {
            movement,
            interaction,
            effect,
        } = event;
        self.movement_timer = PhaseTimer::import(movement.duration, movement.infinite, ctx.now);
        self.interaction_timer = PhaseTimer::import(interaction.duration, interaction.infinite, ctx.now);
        self.effect_timer = PhaseTimer::import(effect.duration, effect.infinite, ctx.now);

        let placement = &interaction.movement;
        if placement.reset_to_base_position {
            self.collider_point = ctx.transform.transform_point(self.base_offset);
        }
        if placement.start_offset != Vec3::ZERO {
            self.collider_point = ctx.transform.transform_point(self.base_offset + placement.start_offset);
        }
        self.collider_anchor = self.collider_point;
    }

    /// Move on to the next event, or finish when this was the last one.
    pub fn cycle_to_next_event(&mut self, config: &AbilityConfig, ctx: &AbilityContext) {
        let next = self.event_index + 1;
        if next < config.events.len() {
            self.import_event(config, next, ctx);
        } else {
            self.complete(ctx);
        }
    }

    /// End the ability and return the slot to its idle state.
    pub fn complete(&mut self, ctx: &AbilityContext) {
        self.movement = MovementInfo::NONE;
        self.event_index = 0;
        self.struck.clear();
        self.pending_hits.clear();
        self.collider_point = ctx.transform.transform_point(self.base_offset);
        self.active = false;
        self.complete = true;
    }

    pub fn actions_completed(&self) -> bool {
        self.movement_timer.completed && self.interaction_timer.completed && self.effect_timer.completed
    }

    fn force_complete_event(&mut self) {
        self.movement = MovementInfo::NONE;
        self.movement_timer.completed = true;
        self.interaction_timer.completed = true;
        self.effect_timer.completed = true;
    }

    fn manage_movement(&mut self, phase: &MovementPhase, ctx: &AbilityContext) {
        if !self.movement_timer.is_running(ctx.now) {
            self.movement = MovementInfo::NONE;
            self.movement_timer.completed = true;
            return;
        }
        // Directionless phases hold the entity still until the timer runs out
        if phase.direction == Vec3::ZERO && !phase.use_forward {
            self.movement = MovementInfo::NONE;
            return;
        }

        let speed = self.movement_timer.speed_for(phase.distance)
            * phase.curve.evaluate(self.movement_timer.ratio(ctx.now));
        let direction = if phase.direction == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            phase.direction.normalize()
        };

        self.movement = MovementInfo {
            source: MovementSource::Action,
            movement: direction * speed,
            input_modifier: phase.input_modifier,
            space: phase.space,
            use_gravity: phase.use_gravity,
            use_forward: phase.use_forward,
        };
    }

    fn manage_interaction(&mut self, phase: &InteractionPhase, ctx: &AbilityContext, physics: &dyn PhysicsQueries) {
        if !self.interaction_timer.is_running(ctx.now) {
            self.interaction_timer.completed = true;
            return;
        }

        self.move_collider(&phase.movement, ctx);

        let mask = phase.collider.hit_mask;
        let hits: OverlapHits = match phase.collider.shape {
            HitShape::None => OverlapHits::new(),
            HitShape::Sphere { radius } => physics.overlap_sphere(self.collider_point, radius, mask),
            HitShape::Box { half_extents } => {
                physics.overlap_box(self.collider_point, half_extents, ctx.transform.rotation, mask)
            }
        };

        let Some(ability) = self.ability.clone() else {
            return;
        };
        for target in hits {
            // One hit per target per event, and never the caster
            if target == ctx.entity || self.struck.contains(&target) {
                continue;
            }
            self.struck.push(target);
            self.pending_hits.push(HitRecord {
                ability: ability.clone(),
                target,
                hit_position: self.collider_point,
                damage: phase.damage.clone(),
            });
        }
    }

    fn move_collider(&mut self, movement: &InteractionMovement, ctx: &AbilityContext) {
        let direction = match movement.space {
            MovementSpace::Local => ctx.transform.rotation * movement.direction.normalize_or_zero(),
            MovementSpace::World => movement.direction.normalize_or_zero(),
        };
        let curve = movement.curve.evaluate(self.interaction_timer.ratio(ctx.now));

        match movement.motion {
            InteractionMotion::None => {}
            InteractionMotion::Velocity => {
                let speed = self.interaction_timer.speed_for(movement.distance);
                self.collider_point += direction * speed * curve * ctx.dt;
            }
            InteractionMotion::Position => {
                let anchor = match movement.space {
                    MovementSpace::Local => ctx
                        .transform
                        .transform_point(self.base_offset + movement.start_offset),
                    MovementSpace::World => self.collider_anchor,
                };
                self.collider_point = anchor + direction * movement.distance * curve;
            }
        }
    }

    /// Effect phases only hold the event open; their values are read by effect hooks.
    fn manage_effect(&mut self, _phase: &EffectPhase, ctx: &AbilityContext) {
        if !self.effect_timer.is_running(ctx.now) {
            self.effect_timer.completed = true;
        }
    }

    pub fn ability(&self) -> Option<&AbilityId> {
        self.ability.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn event_index(&self) -> usize {
        self.event_index
    }

    pub fn movement_info(&self) -> MovementInfo {
        self.movement
    }

    pub fn collider_point(&self) -> Vec3 {
        self.collider_point
    }

    /// Completion flags of the current event as (movement, interaction, effect).
    pub fn phase_completion(&self) -> (bool, bool, bool) {
        (
            self.movement_timer.completed,
            self.interaction_timer.completed,
            self.effect_timer.completed,
        )
    }
}
