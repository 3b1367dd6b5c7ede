#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Scrap Siege scenarios.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use scrap_siege_session::{ArenaConfig, Outcome, Scenario, Session, Summary};

/// Runs a scripted Scrap Siege scenario and prints the result.
#[derive(Parser, Debug)]
#[command(name = "scrap-siege", version)]
struct Cli {
    /// Arena configuration file; built-in defaults when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Scenario file describing placements and timed spawns.
    #[arg(long, value_name = "FILE")]
    scenario: Option<PathBuf>,
    /// Overrides the number of simulated steps.
    #[arg(long)]
    steps: Option<u32>,
    /// Overrides the step length in milliseconds.
    #[arg(long = "dt-ms", value_name = "MILLIS")]
    dt_ms: Option<u64>,
    /// Only report warnings and the final summary.
    #[arg(long, short)]
    quiet: bool,
}

/// Entry point for the Scrap Siege command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let default = if cli.quiet { "warn" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();

    let config = match &cli.config {
        Some(path) => ArenaConfig::load(path)
            .with_context(|| format!("load arena config {}", path.display()))?,
        None => ArenaConfig::default(),
    };
    let mut scenario = match &cli.scenario {
        Some(path) => {
            Scenario::load(path).with_context(|| format!("load scenario {}", path.display()))?
        }
        None => Scenario::default(),
    };
    if let Some(steps) = cli.steps {
        scenario.steps = steps;
    }
    if let Some(dt_ms) = cli.dt_ms {
        scenario.dt_ms = dt_ms;
    }

    info!(
        "running {} steps of {:?}",
        scenario.steps,
        scenario.step_duration()
    );
    let mut session = Session::new(config);
    let summary = session.run(&scenario).context("run scenario")?;
    print!("{}", report(&summary));
    Ok(())
}

fn report(summary: &Summary) -> String {
    let outcome = match summary.outcome {
        Outcome::Ongoing => "station holding",
        Outcome::Defeat => "station destroyed",
    };
    let station = summary
        .station_health
        .map_or_else(|| "none".to_owned(), |health| health.to_string());
    let tally = &summary.tally;
    format!(
        "outcome: {outcome}\n\
         steps: {} ({:.2}s simulated)\n\
         station health: {station}\n\
         scrap: {}\n\
         hostiles: {} spawned, {} killed, {} alive\n\
         structures: {} built, {} lost, {} rejected, {} zones expired\n\
         combat: {} attacks landed, {} explosions\n",
        summary.steps,
        summary.elapsed.as_secs_f32(),
        summary.scrap,
        tally.spawned,
        tally.hostiles_killed,
        summary.hostiles_alive,
        tally.structures_built,
        tally.structures_lost,
        tally.placements_rejected,
        tally.zones_expired,
        tally.attacks_landed,
        tally.explosions,
    )
}
