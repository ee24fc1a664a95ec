//! Run Flow
//!
//! A run waits for a player to press Start, plays until every player is out,
//! then waits for Start again to put the players back at their spawn points.
//! While playing, [`GameFlow`] follows how far the players have pushed along
//! the forward (-Z) axis. That distance is the depth, and the best depth of
//! the run is its score. Scores are kept in a high-score board.
//!
//! [`ObstacleZone`]s stop any entity that enters them. A stopped player no
//! longer counts as in the run.

use bevy::ecs::query::Has;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::clock::SimClock;
use super::components::{EntityKind, SimEntity};
use super::input::{InputButton, InputState};
use super::movement::{MovementConfig, MovementState};
use super::physics::{LayerMask, PhysicsQueries, PhysicsWorld};
use super::status::StatusState;
use crate::combat::log::{CombatLog, CombatLogEventType};

/// Where the run is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    WaitingToStart,
    Playing,
    GameOver,
}

/// Scenario switches for the run flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameFlowConfig {
    /// Begin in the playing phase instead of waiting for Start
    pub auto_start: bool,
    /// Depths announced the first time the players pass them
    pub depth_markers: Vec<f32>,
}

impl Default for GameFlowConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            depth_markers: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: f32,
    /// Simulation time the run ended
    pub recorded_at: f32,
}

/// Scores of finished runs, in the order they were recorded.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    entries: Vec<ScoreEntry>,
}

impl ScoreBoard {
    /// Record `score` if the board is empty or it beats any entry on it.
    /// Returns whether it was recorded.
    pub fn check_new_score(&mut self, score: f32, now: f32) -> bool {
        let score = score.abs();
        let qualifies = self.entries.is_empty() || self.entries.iter().any(|entry| score > entry.score);
        if qualifies {
            self.entries.push(ScoreEntry {
                score,
                recorded_at: now,
            });
        }
        qualifies
    }

    /// Best recorded score, 0 when nothing is recorded.
    pub fn high_score(&self) -> f32 {
        self.entries.iter().map(|entry| entry.score).fold(0.0, f32::max)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }
}

/// Run phase, depth and score.
#[derive(Resource, Clone, Debug)]
pub struct GameFlow {
    phase: GamePhase,
    depth: f32,
    score: f32,
    /// Ascending
    depth_markers: Vec<f32>,
    next_marker: usize,
    scores: ScoreBoard,
}

impl Default for GameFlow {
    fn default() -> Self {
        Self::new(GameFlowConfig::default())
    }
}

impl GameFlow {
    pub fn new(config: GameFlowConfig) -> Self {
        let mut depth_markers = config.depth_markers;
        depth_markers.sort_by(f32::total_cmp);
        Self {
            phase: if config.auto_start {
                GamePhase::Playing
            } else {
                GamePhase::WaitingToStart
            },
            depth: 0.0,
            score: 0.0,
            depth_markers,
            next_marker: 0,
            scores: ScoreBoard::default(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Furthest distance along -Z reached by a player still in the run
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Best depth of the current run
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn high_score(&self) -> f32 {
        self.scores.high_score()
    }

    /// The next depth marker the players have not passed yet.
    pub fn next_depth_marker(&self) -> Option<f32> {
        self.depth_markers.get(self.next_marker).copied()
    }

    /// WaitingToStart -> Playing, clearing the previous run's depth and score.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::WaitingToStart {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.depth = 0.0;
        self.score = 0.0;
        self.next_marker = 0;
        true
    }

    /// Playing -> GameOver, offering the score to the board.
    ///
    /// Returns `None` when no run was in progress, otherwise whether the score
    /// made the board.
    pub fn end(&mut self, now: f32) -> Option<bool> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.phase = GamePhase::GameOver;
        Some(self.scores.check_new_score(self.score, now))
    }

    /// GameOver -> WaitingToStart.
    pub fn reset(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        self.phase = GamePhase::WaitingToStart;
        true
    }

    /// Take this tick's depth. Returns every marker passed for the first time.
    pub fn update_depth(&mut self, depth: f32) -> Vec<f32> {
        self.depth = depth.max(0.0);
        self.score = self.score.max(self.depth);

        let mut passed = Vec::new();
        while let Some(marker) = self.next_depth_marker() {
            if self.depth < marker {
                break;
            }
            passed.push(marker);
            self.next_marker += 1;
        }
        passed
    }
}

/// Set on an entity an obstacle has stopped. Cleared when the run is reset.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct MovementDisabled;

/// Where an entity was spawned, restored on reset.
#[derive(Component, Clone, Copy, Debug)]
pub struct SpawnPoint(pub Transform);

/// Box volume that stops every entity on `stop_mask` that enters it, once per run.
#[derive(Component, Clone, Debug)]
pub struct ObstacleZone {
    pub half_extents: Vec3,
    pub stop_mask: LayerMask,
    struck: Vec<Entity>,
}

impl ObstacleZone {
    pub fn new(half_extents: Vec3, stop_mask: LayerMask) -> Self {
        Self {
            half_extents,
            stop_mask,
            struck: Vec::new(),
        }
    }

    pub fn has_struck(&self, entity: Entity) -> bool {
        self.struck.contains(&entity)
    }

    /// Forget who was stopped so the zone can catch them again.
    pub fn reset(&mut self) {
        self.struck.clear();
    }
}

/// Move the run between phases on Start presses, and end it once no player
/// is left in it.
#[allow(clippy::type_complexity)]
pub fn manage_game_flow(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut flow: ResMut<GameFlow>,
    mut combat_log: ResMut<CombatLog>,
    mut zones: Query<&mut ObstacleZone>,
    mut players: Query<(
        Entity,
        &SimEntity,
        &InputState,
        &mut StatusState,
        &mut Transform,
        &mut MovementState,
        &MovementConfig,
        Option<&SpawnPoint>,
        Has<MovementDisabled>,
    )>,
) {
    let start_pressed = players
        .iter()
        .any(|(_, sim, input, ..)| sim.kind == EntityKind::Player && input.was_pressed(InputButton::Start));
    combat_log.sim_time = clock.elapsed;

    match flow.phase() {
        GamePhase::WaitingToStart => {
            if !start_pressed {
                return;
            }
            for mut zone in zones.iter_mut() {
                zone.reset();
            }
            flow.start();
            info!("Run started");
            combat_log.log(CombatLogEventType::SimEvent, "Run started".to_string());
        }
        GamePhase::Playing => {
            let mut total = 0;
            let mut remaining = 0;
            for (_, sim, _, status, .., disabled) in players.iter() {
                if sim.kind != EntityKind::Player {
                    continue;
                }
                total += 1;
                if !status.is_dead() && !disabled {
                    remaining += 1;
                }
            }
            if total == 0 || remaining > 0 {
                return;
            }

            let score = flow.score();
            let Some(recorded) = flow.end(clock.elapsed) else {
                return;
            };
            let message = if recorded {
                format!("Game over at score {:.1} (new high score)", score)
            } else {
                format!("Game over at score {:.1}", score)
            };
            info!("{}", message);
            combat_log.log(CombatLogEventType::SimEvent, message);
        }
        GamePhase::GameOver => {
            if !start_pressed {
                return;
            }
            for (entity, sim, _, mut status, mut transform, mut movement, config, spawn, _) in players.iter_mut() {
                if sim.kind != EntityKind::Player {
                    continue;
                }
                if let Some(spawn) = spawn {
                    *transform = spawn.0;
                }
                let status_config = status.config;
                *status = StatusState::new(status_config);
                *movement = MovementState::new(config);
                commands.entity(entity).remove::<MovementDisabled>();
                debug!("{} reset to its spawn point", sim.name);
            }
            flow.reset();
            info!("Players reset, waiting for Start");
            combat_log.log(CombatLogEventType::SimEvent, "Players reset, waiting for Start".to_string());
        }
    }
}

/// Stop every entity that has entered an obstacle zone since the zone was last reset.
pub fn apply_obstacles(
    mut commands: Commands,
    clock: Res<SimClock>,
    physics: Res<PhysicsWorld>,
    mut combat_log: ResMut<CombatLog>,
    mut zones: Query<(Entity, &Transform, &mut ObstacleZone)>,
    entities: Query<&SimEntity>,
) {
    for (zone_entity, transform, mut zone) in zones.iter_mut() {
        let hits = physics.overlap_box(transform.translation, zone.half_extents, transform.rotation, zone.stop_mask);
        for target in hits {
            if target == zone_entity || zone.has_struck(target) {
                continue;
            }
            zone.struck.push(target);
            commands.entity(target).try_insert(MovementDisabled);

            let name = entities.get(target).map(|e| e.name.as_str()).unwrap_or("Unknown");
            info!("{} stopped by an obstacle", name);
            combat_log.sim_time = clock.elapsed;
            combat_log.log(CombatLogEventType::SimEvent, format!("{} stopped by an obstacle", name));
        }
    }
}

/// Measure how far the players still in the run have pushed along -Z.
pub fn track_depth(
    clock: Res<SimClock>,
    mut flow: ResMut<GameFlow>,
    mut combat_log: ResMut<CombatLog>,
    players: Query<(&SimEntity, &Transform, &StatusState, Has<MovementDisabled>)>,
) {
    if !flow.is_playing() {
        return;
    }

    let depth = players
        .iter()
        .filter(|(sim, _, status, disabled)| sim.kind == EntityKind::Player && !status.is_dead() && !disabled)
        .map(|(_, transform, ..)| -transform.translation.z)
        .fold(0.0, f32::max);

    for marker in flow.update_depth(depth) {
        info!("Depth marker {:.1} passed", marker);
        combat_log.sim_time = clock.elapsed;
        combat_log.log(CombatLogEventType::SimEvent, format!("Depth marker {:.1} passed", marker));
    }
}
