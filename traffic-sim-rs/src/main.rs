// traffic-sim-rs/src/main.rs
// Entry point for the navigation traffic simulator
//
// Sends a navigation request to ART every two seconds, with ~20% of vector
// searches failing as simulated Qdrant timeouts and ~20% delayed by three
// seconds. Runs until Ctrl+C.

use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;

use traffic_sim::{
    run_until_interrupted, BackendConfig, Collaborators, ConsoleReporter, Simulation, SimulationConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::default();
    let reporter = ConsoleReporter::new();
    reporter.print_banner(&config);

    let collaborators = match BackendConfig::from_env() {
        Ok(backend) => Collaborators::connect(&backend).await,
        Err(e) => Err(e),
    };

    let simulation = match Simulation::prepare(config, collaborators, Arc::new(reporter)) {
        Ok(simulation) => simulation,
        Err(e) => {
            // Already reported on the console; a failed startup is a clean stop
            log::error!("Simulation not started: {}", e);
            return Ok(());
        }
    };

    let cancel = CancellationToken::new();
    let (summary, faults) =
        run_until_interrupted(simulation.run(cancel.clone()), tokio::signal::ctrl_c(), &cancel)
            .await?;

    reporter.print_shutdown(&summary, &faults);

    Ok(())
}
