//! Load balancer simulator (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                         SIMULATION                               │
//!   │                                                                  │
//!   │  ┌─────────┐   ┌──────────┐   ┌───────────────┐   ┌───────────┐  │
//!   │  │  clock  │──▶│ clients  │──▶│ routing       │──▶│  server   │  │
//!   │  │  tick   │   │ id gen   │   │ engine        │   │  pool     │  │
//!   │  └────┬────┘   └──────────┘   └───────────────┘   └─────┬─────┘  │
//!   │       │                                                 │        │
//!   │       ▼                                                 ▼        │
//!   │  ┌─────────┐                                     ┌─────────────┐ │
//!   │  │ history │                                     │  request    │ │
//!   │  │  ring   │                                     │  lifecycle  │ │
//!   │  └─────────┘                                     └─────────────┘ │
//!   │                                                                  │
//!   │  Cross-cutting: config · observability · runtime driver          │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use lb_sim::config::{load_config, SimConfig};
use lb_sim::observability::{logging, metrics};
use lb_sim::runtime::{Shutdown, SimulationDriver};
use lb_sim::{Policy, ServerId, Simulation, SimulationHandle};

#[derive(Parser)]
#[command(name = "lb-sim")]
#[command(about = "Load balancer routing simulator", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in real time until Ctrl-C or the duration elapses
    Run {
        /// Routing policy (overrides the config file)
        #[arg(short, long)]
        policy: Option<Policy>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },
    /// Fast-forward a number of ticks on virtual time and print a JSON report
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value_t = 50)]
        ticks: u64,

        /// Routing policy (overrides the config file)
        #[arg(short, long)]
        policy: Option<Policy>,

        /// Random seed (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Toggle a server's availability before a tick, as TICK:SERVER
        #[arg(long = "toggle", value_parser = parse_toggle)]
        toggles: Vec<(u64, ServerId)>,
    },
    /// Validate the configuration and print it
    Check,
}

fn parse_toggle(s: &str) -> Result<(u64, ServerId), String> {
    let (tick, server) = s
        .split_once(':')
        .ok_or_else(|| format!("expected TICK:SERVER, got '{}'", s))?;
    let tick = tick.parse().map_err(|e| format!("invalid tick '{}': {}", tick, e))?;
    let server = server
        .parse::<u32>()
        .map_err(|e| format!("invalid server id '{}': {}", server, e))?;
    Ok((tick, ServerId(server)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        servers = config.servers.len(),
        policy = %config.routing.policy,
        tick_interval_ms = config.simulation.tick_interval_ms,
        service_duration_ms = config.simulation.service_duration_ms,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { policy, duration_secs } => run(config, policy, duration_secs).await,
        Commands::Simulate {
            ticks,
            policy,
            seed,
            toggles,
        } => simulate(config, ticks, policy, seed, &toggles),
        Commands::Check => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run(
    config: SimConfig,
    policy: Option<Policy>,
    duration_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let mut simulation = Simulation::new(&config)?;
    if let Some(policy) = policy {
        simulation.set_policy(policy);
    }
    let handle = SimulationHandle::new(simulation);

    let shutdown = Shutdown::new();
    let driver = SimulationDriver::new(handle.clone(), config.simulation.driver_resolution_ms);
    let task = tokio::spawn(driver.run(shutdown.subscribe()));

    handle.start();

    let deadline = async {
        match duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupt received"),
        _ = deadline => tracing::info!("Run duration elapsed"),
    }

    handle.stop();
    shutdown.trigger();
    task.await?;

    let report = json!({
        "policy": handle.policy(),
        "stats": handle.stats(),
        "pool": handle.pool_snapshot(),
        "last_message": handle.last_decision_message(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("Shutdown complete");
    Ok(())
}

fn simulate(
    mut config: SimConfig,
    ticks: u64,
    policy: Option<Policy>,
    seed: Option<u64>,
    toggles: &[(u64, ServerId)],
) -> Result<(), Box<dyn std::error::Error>> {
    if seed.is_some() {
        config.simulation.seed = seed;
    }

    let mut simulation = Simulation::new(&config)?;
    if let Some(policy) = policy {
        simulation.set_policy(policy);
    }
    simulation.start();

    for tick in 1..=ticks {
        for (_, server) in toggles.iter().filter(|(at, _)| *at == tick) {
            simulation.toggle_availability(*server)?;
        }
        simulation.step();
    }

    let report = json!({
        "policy": simulation.policy(),
        "now_ms": simulation.now_ms(),
        "stats": simulation.stats(),
        "pool": simulation.pool_snapshot(),
        "in_flight": simulation.in_flight().len(),
        "history": simulation.history_snapshot(),
        "last_message": simulation.last_decision_message(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
