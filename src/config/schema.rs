//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the simulator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::load_balancer::Policy;

/// Root configuration for the simulator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Timeline and request generation settings.
    pub simulation: SimulationConfig,

    /// Routing policy selection.
    pub routing: RoutingConfig,

    /// Backend server definitions, in pool order.
    pub servers: Vec<ServerConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            routing: RoutingConfig::default(),
            servers: [1, 2, 1, 3]
                .iter()
                .enumerate()
                .map(|(i, &weight)| ServerConfig {
                    name: format!("server-{}", i + 1),
                    capacity: default_capacity(),
                    weight,
                })
                .collect(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Timeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time between request arrivals in milliseconds.
    pub tick_interval_ms: u64,

    /// How long an admitted request occupies its server, in milliseconds.
    pub service_duration_ms: u64,

    /// Number of load samples kept for charting.
    pub history_len: usize,

    /// Age after which the safety sweep reclaims a request record.
    pub max_request_age_ms: u64,

    /// Bound on distinct client identifiers. `None` draws a fresh token per tick.
    pub client_population: Option<u32>,

    /// Seed for reproducible runs.
    pub seed: Option<u64>,

    /// Wall-clock step of the real-time driver in milliseconds.
    pub driver_resolution_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 800,
            service_duration_ms: 3000,
            history_len: 30,
            max_request_age_ms: 12_000,
            client_population: None,
            seed: None,
            driver_resolution_ms: 50,
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Active policy at startup.
    pub policy: Policy,
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Display name.
    pub name: String,

    /// Maximum concurrent requests.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Weight for weighted round robin (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_capacity() -> u32 {
    5
}

fn default_weight() -> u32 {
    1
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.servers.len(), 4);
        let weights: Vec<u32> = config.servers.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![1, 2, 1, 3]);
        assert_eq!(config.routing.policy, Policy::RoundRobin);
        assert!(config.simulation.max_request_age_ms >= config.simulation.service_duration_ms);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            [routing]
            policy = "least_connections"

            [[servers]]
            name = "alpha"
            capacity = 2

            [[servers]]
            name = "beta"
            weight = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.routing.policy, Policy::LeastConnections);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].weight, 1);
        assert_eq!(config.servers[1].capacity, 5);
        assert_eq!(config.simulation.tick_interval_ms, 800);
    }
}
