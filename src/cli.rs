//! Command-line interface for Homebound

use clap::Parser;
use std::path::PathBuf;

/// Headless runner for the entity simulation core
#[derive(Parser, Debug)]
#[command(name = "homebound")]
#[command(about = "Run an entity simulation scenario headlessly")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file to run
    #[arg(long, value_name = "SCENARIO_FILE", default_value = "assets/scenarios/skirmish.json")]
    pub scenario: PathBuf,

    /// RON settings file
    #[arg(long, value_name = "SETTINGS_FILE", default_value = "settings.ron")]
    pub settings: PathBuf,

    /// Where to write the JSON report (result and combat log)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Override the scenario's maximum duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["homebound"]);
        assert_eq!(args.scenario, PathBuf::from("assets/scenarios/skirmish.json"));
        assert!(args.output.is_none());
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["homebound", "--seed", "42", "--max-duration", "5.5", "--output", "out.json"]);
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.max_duration, Some(5.5));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }
}
