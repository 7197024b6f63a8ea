//! Experiment runner for the arbor voxel-tree simulation.

use anyhow::Result;
use arbor_core::SimulationConfig;
use arbor_world::Simulation;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional first argument: path to a JSON configuration file.
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading configuration");
            SimulationConfig::from_json_file(&path)?
        }
        None => SimulationConfig::default(),
    };

    let mut simulation = Simulation::new(config)?;
    let report = simulation.run();

    info!(
        days_run = report.days_run,
        births = report.births,
        deaths = report.deaths,
        peak_population = report.peak_population,
        final_population = report.final_population,
        "experiment complete"
    );
    Ok(())
}
