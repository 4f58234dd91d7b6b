//! Shared builders for integration tests.

use lb_sim::config::{ServerConfig, SimConfig};
use lb_sim::load_balancer::random::ScriptedRandom;
use lb_sim::{Policy, Simulation};

/// Config with one server per `(capacity, weight)` pair and a short timeline.
#[allow(dead_code)]
pub fn config(servers: &[(u32, u32)], policy: Policy) -> SimConfig {
    let mut config = SimConfig::default();
    config.servers = servers
        .iter()
        .enumerate()
        .map(|(i, &(capacity, weight))| ServerConfig {
            name: format!("server-{}", i + 1),
            capacity,
            weight,
        })
        .collect();
    config.routing.policy = policy;
    config.simulation.tick_interval_ms = 100;
    config.simulation.service_duration_ms = 1_000;
    config.simulation.max_request_age_ms = 5_000;
    config.simulation.history_len = 10;
    config
}

/// Started simulation with a scripted random source.
#[allow(dead_code)]
pub fn started(config: &SimConfig, random: Vec<u64>) -> Simulation {
    let mut sim = Simulation::with_random(config, Box::new(ScriptedRandom::new(random))).expect("valid config");
    sim.start();
    sim
}

/// Started simulation with a seeded standard random source.
#[allow(dead_code)]
pub fn seeded(mut config: SimConfig, seed: u64) -> Simulation {
    config.simulation.seed = Some(seed);
    let mut sim = Simulation::new(&config).expect("valid config");
    sim.start();
    sim
}
