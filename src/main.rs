//! Homebound - headless scenario runner
//!
//! Loads a scenario, runs it to completion and prints a summary.

use homebound::cli::parse_args;
use homebound::headless::{run_scenario, ScenarioConfig, ScenarioResult};
use homebound::settings::SimulationSettings;

fn main() {
    let args = parse_args();

    let settings = SimulationSettings::load(&args.settings);

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading scenario {}: {}", args.scenario.display(), e);
            std::process::exit(1);
        }
    };

    // Command line beats scenario, scenario beats settings
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    config.random_seed = args.seed.or(config.random_seed).or(settings.random_seed);
    if let Some(output) = args.output {
        config.output_path = Some(output);
    }

    match run_scenario(config, &settings) {
        Ok(result) => print_summary(&result),
        Err(e) => {
            eprintln!("Error running scenario: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_summary(result: &ScenarioResult) {
    println!(
        "Scenario '{}': {:?} after {:.2}s ({} ticks)",
        result.scenario, result.outcome, result.duration, result.ticks
    );
    if let Some(seed) = result.random_seed {
        println!("  Seed: {}", seed);
    }
    let high_score = result.high_scores.iter().map(|entry| entry.score).fold(0.0, f32::max);
    println!(
        "  Run {:?}: depth {:.1} score {:.1} high score {:.1}",
        result.game_phase, result.depth, result.score, high_score
    );
    for entity in &result.entities {
        println!(
            "  {:<16} {:?} hp {:>6.1}/{:<6.1} dealt {:>6.1} taken {:>6.1} state {}",
            entity.name,
            entity.kind,
            entity.final_health,
            entity.max_health,
            entity.damage_dealt,
            entity.damage_taken,
            entity.final_state.as_deref().unwrap_or("-"),
        );
    }
}
