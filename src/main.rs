use director_network::config::{DEFAULT_LOG_CONFIG, LOG_CONFIG_ENV};
use director_network::output::print_placements;
use director_network::plan::{allocate, build_networks, read_plan};
use director_network::Logger;
use std::env;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Keep main thin, it can't carry tests
    dotenv::dotenv().ok();
    let log_config = env::var(LOG_CONFIG_ENV).unwrap_or_else(|_| DEFAULT_LOG_CONFIG.to_string());
    log4rs::init_file(&log_config, Default::default())?;
    log::info!("#Start main()");

    let plan_path = env::args()
        .nth(1)
        .ok_or("usage: director-network <plan.json>")?;

    let logger = Logger::default();
    let plan = read_plan(&plan_path)?;
    let networks = build_networks(&plan, &logger)?;
    let placed = allocate(&networks, &plan.instances, &logger).await?;

    print_placements(&placed, &networks);
    log::info!("#End main() placed {} instance(s)", placed.len());
    Ok(())
}
