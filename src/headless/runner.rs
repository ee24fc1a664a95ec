//! Headless scenario execution
//!
//! Builds a windowless app around [`SimulationPlugin`], spawns the scenario,
//! and steps it tick by tick until one side is eliminated or time runs out.

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::settings::SimulationSettings;
use crate::sim::abilities::{load_ability_definitions, AbilityDefinitions};
use crate::sim::ai::{load_state_machines, StateMachine, StateMachineDefinitions};
use crate::sim::clock::SimClock;
use crate::sim::components::{EntityKind, GameRng, SimEntity};
use crate::sim::game::{GameFlow, GamePhase, ScoreEntry};
use crate::sim::spawn::{spawn_entity, spawn_obstacle};
use crate::sim::status::StatusState;
use crate::sim::SimulationPlugin;

use super::config::ScenarioConfig;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioOutcome {
    PlayersWin,
    EnemiesWin,
    /// Both sides eliminated on the same tick
    Draw,
    /// Max duration reached with both sides standing
    Timeout,
}

/// Statistics for a single entity after the run
#[derive(Debug, Clone, Serialize)]
pub struct EntityResult {
    pub name: String,
    pub kind: EntityKind,
    pub max_health: f32,
    /// Health remaining at the end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub killing_blows: usize,
    pub final_position: Vec3,
    /// AI state at the end, for AI-driven entities
    pub final_state: Option<String>,
}

/// Result of a completed headless run
///
/// Programmatic access to the outcome for tests and analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub outcome: ScenarioOutcome,
    /// Simulated seconds
    pub duration: f32,
    pub ticks: u64,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    /// Run phase when the scenario stopped
    pub game_phase: GamePhase,
    /// Furthest distance along -Z held by a player still in the run
    pub depth: f32,
    /// Best depth of the current run
    pub score: f32,
    pub high_scores: Vec<ScoreEntry>,
    pub entities: Vec<EntityResult>,
}

impl ScenarioResult {
    pub fn entity(&self, name: &str) -> Option<&EntityResult> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// JSON report written after a run
#[derive(Serialize)]
struct ScenarioReport<'a> {
    result: &'a ScenarioResult,
    combat_log: &'a CombatLog,
}

/// A scenario loaded into a ready-to-step app.
pub struct ScenarioRunner {
    app: App,
    config: ScenarioConfig,
    spawned: Vec<Entity>,
    ticks_run: u64,
}

impl ScenarioRunner {
    /// Build the app and spawn every entity of `config`.
    ///
    /// Fails when an entity references an ability, card or state machine that
    /// is not defined.
    pub fn new(
        config: ScenarioConfig,
        abilities: AbilityDefinitions,
        machines: StateMachineDefinitions,
    ) -> Result<Self, String> {
        Self::assemble(config, abilities, machines, None)
    }

    fn assemble(
        config: ScenarioConfig,
        abilities: AbilityDefinitions,
        machines: StateMachineDefinitions,
        logging: Option<LogPlugin>,
    ) -> Result<Self, String> {
        config.validate()?;
        check_references(&config, &abilities, &machines)?;

        let game_rng = match config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };

        let mut app = App::new();
        if let Some(log_plugin) = logging {
            app.add_plugins(log_plugin);
        }
        // Minimal plugins: no window, no rendering. The runner steps the app
        // itself instead of handing it to the schedule runner loop.
        app.add_plugins(MinimalPlugins)
            .insert_resource(game_rng)
            .insert_resource(abilities)
            .insert_resource(machines)
            .insert_resource(GameFlow::new(config.game.clone()))
            .add_plugins(SimulationPlugin {
                tick_rate_hz: config.tick_rate_hz,
                ground_height: config.ground_height,
            });
        app.finish();
        app.cleanup();

        let world = app.world_mut();
        for obstacle in &config.obstacles {
            spawn_obstacle(world, obstacle.center, obstacle.half_extents, obstacle.stop_mask);
        }
        let spawned = config
            .entities
            .iter()
            .map(|blueprint| spawn_entity(world, blueprint))
            .collect();

        let mut log = world.resource_mut::<CombatLog>();
        log.clear();
        log.log(
            CombatLogEventType::SimEvent,
            format!("Scenario '{}' started with {} entities", config.name, config.entities.len()),
        );

        info!(
            "Scenario '{}' ready: {} entities, {} obstacles",
            config.name,
            config.entities.len(),
            config.obstacles.len()
        );

        Ok(Self {
            app,
            config,
            spawned,
            ticks_run: 0,
        })
    }

    /// Build a runner with console logging, loading definitions from the
    /// scenario paths or the settings defaults.
    pub fn from_config(config: ScenarioConfig, settings: &SimulationSettings) -> Result<Self, String> {
        let abilities_path = config.abilities_path.clone().unwrap_or_else(|| settings.abilities_path.clone());
        let ai_states_path = config.ai_states_path.clone().unwrap_or_else(|| settings.ai_states_path.clone());

        let abilities = if abilities_path.exists() {
            load_ability_definitions(&abilities_path)?
        } else {
            warn!("No ability definitions at {}, starting empty", abilities_path.display());
            AbilityDefinitions::default()
        };
        let machines = if ai_states_path.exists() {
            load_state_machines(&ai_states_path)?
        } else {
            warn!("No state machines at {}, starting empty", ai_states_path.display());
            StateMachineDefinitions::default()
        };

        let level = settings.log_level.parse::<Level>().unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using info", settings.log_level);
            Level::INFO
        });
        let log_plugin = LogPlugin {
            level,
            ..default()
        };

        Self::assemble(config, abilities, machines, Some(log_plugin))
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Entities in the order the scenario lists them
    pub fn entities(&self) -> &[Entity] {
        &self.spawned
    }

    /// Look up a spawned entity by its scenario name.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.config
            .entities
            .iter()
            .position(|blueprint| blueprint.name == name)
            .and_then(|index| self.spawned.get(index).copied())
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.app.update();
        self.ticks_run += 1;
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Number of ticks that fit into the max duration.
    pub fn max_ticks(&self) -> u64 {
        (self.config.max_duration_secs * self.config.tick_rate_hz).ceil() as u64
    }

    /// Winner, if one side has been wiped out. Sides with no members at the
    /// start never count as eliminated.
    pub fn check_elimination(&self) -> Option<ScenarioOutcome> {
        let mut players = (0usize, 0usize);
        let mut enemies = (0usize, 0usize);

        let world = self.app.world();
        for &entity in &self.spawned {
            let (Some(sim), Some(status)) = (world.get::<SimEntity>(entity), world.get::<StatusState>(entity)) else {
                continue;
            };
            let side = match sim.kind {
                EntityKind::Player => &mut players,
                EntityKind::Enemy => &mut enemies,
                EntityKind::None => continue,
            };
            side.0 += 1;
            if !status.is_dead() {
                side.1 += 1;
            }
        }

        if players.0 == 0 || enemies.0 == 0 {
            return None;
        }
        match (players.1 > 0, enemies.1 > 0) {
            (true, true) => None,
            (true, false) => Some(ScenarioOutcome::PlayersWin),
            (false, true) => Some(ScenarioOutcome::EnemiesWin),
            (false, false) => Some(ScenarioOutcome::Draw),
        }
    }

    /// Step until a side is eliminated or the max duration passes.
    pub fn run(&mut self) -> ScenarioResult {
        let max_ticks = self.max_ticks();
        let mut outcome = ScenarioOutcome::Timeout;

        while self.ticks_run < max_ticks {
            self.step();
            if self.config.stop_on_side_eliminated {
                if let Some(ended) = self.check_elimination() {
                    outcome = ended;
                    break;
                }
            }
        }

        let elapsed = self.app.world().resource::<SimClock>().elapsed;
        match outcome {
            ScenarioOutcome::Timeout => info!("Scenario timed out after {:.1}s", elapsed),
            ScenarioOutcome::Draw => info!("Scenario ended in a draw (both sides eliminated)"),
            ScenarioOutcome::PlayersWin => info!("Scenario ended! Players win"),
            ScenarioOutcome::EnemiesWin => info!("Scenario ended! Enemies win"),
        }
        self.app.world_mut().resource_mut::<CombatLog>().log(
            CombatLogEventType::SimEvent,
            format!("Scenario '{}' ended: {:?} at {:.2}s", self.config.name, outcome, elapsed),
        );

        self.build_result(outcome)
    }

    /// Snapshot of every spawned entity.
    pub fn build_result(&self, outcome: ScenarioOutcome) -> ScenarioResult {
        let world = self.app.world();
        let log = world.resource::<CombatLog>();
        let clock = world.resource::<SimClock>();
        let flow = world.resource::<GameFlow>();

        let entities = self
            .spawned
            .iter()
            .filter_map(|&entity| {
                let sim = world.get::<SimEntity>(entity)?;
                let status = world.get::<StatusState>(entity)?;
                let position = world.get::<Transform>(entity).map(|t| t.translation).unwrap_or_default();
                Some(EntityResult {
                    name: sim.name.clone(),
                    kind: sim.kind,
                    max_health: status.config.max_health,
                    final_health: status.health(),
                    survived: !status.is_dead(),
                    damage_dealt: log.total_damage_dealt(&sim.name),
                    damage_taken: log.total_damage_taken(&sim.name),
                    killing_blows: log.killing_blows(&sim.name),
                    final_position: position,
                    final_state: world
                        .get::<StateMachine>(entity)
                        .and_then(|machine| machine.current().map(ToString::to_string)),
                })
            })
            .collect();

        ScenarioResult {
            scenario: self.config.name.clone(),
            outcome,
            duration: clock.elapsed,
            ticks: clock.tick,
            random_seed: self.config.random_seed,
            game_phase: flow.phase(),
            depth: flow.depth(),
            score: flow.score(),
            high_scores: flow.scores().entries().to_vec(),
            entities,
        }
    }

    /// Write the result and the full combat log as pretty-printed JSON.
    pub fn save_report(&self, result: &ScenarioResult, path: &Path) -> Result<(), String> {
        let report = ScenarioReport {
            result,
            combat_log: self.app.world().resource::<CombatLog>(),
        };
        let json = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to serialize report: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        info!("Scenario report saved to {}", path.display());
        Ok(())
    }
}

fn check_references(
    config: &ScenarioConfig,
    abilities: &AbilityDefinitions,
    machines: &StateMachineDefinitions,
) -> Result<(), String> {
    for blueprint in &config.entities {
        if let Some(machine) = &blueprint.state_machine {
            if machines.get(machine).is_none() {
                return Err(format!("entity '{}' uses unknown state machine '{}'", blueprint.name, machine));
            }
        }
        for ability in &blueprint.abilities {
            if abilities.get(ability).is_none() {
                return Err(format!("entity '{}' uses unknown ability '{}'", blueprint.name, ability));
            }
        }
        if let Some(loadout) = &blueprint.cards {
            for card in &loadout.cards {
                if abilities.card(card).is_none() {
                    return Err(format!("entity '{}' holds unknown card '{}'", blueprint.name, card));
                }
            }
            if let Some(basic) = &loadout.basic_attack {
                if abilities.get(basic).is_none() {
                    return Err(format!("entity '{}' uses unknown basic attack '{}'", blueprint.name, basic));
                }
            }
        }
    }
    Ok(())
}

/// Run a scenario to completion, saving the report when the scenario names
/// an output path.
pub fn run_scenario(config: ScenarioConfig, settings: &SimulationSettings) -> Result<ScenarioResult, String> {
    info!(
        "Starting scenario '{}' ({} entities, max {:.0}s)",
        config.name,
        config.entities.len(),
        config.max_duration_secs
    );

    let output_path = config.output_path.clone();
    let mut runner = ScenarioRunner::from_config(config, settings)?;
    let result = runner.run();

    if let Some(path) = output_path {
        runner.save_report(&result, &path)?;
    }

    Ok(result)
}
