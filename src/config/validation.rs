//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and cross-field
//! constraints. Every problem is reported, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SimConfig;
use crate::simulation::clients::MAX_CLIENT_POPULATION;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one server must be configured")]
    NoServers,

    #[error("server '{0}' has zero capacity")]
    ZeroCapacity(String),

    #[error("server '{0}' has zero weight")]
    ZeroWeight(String),

    #[error("server at position {0} has an empty name")]
    EmptyServerName(usize),

    #[error("duplicate server name '{0}'")]
    DuplicateServerName(String),

    #[error("simulation.{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("max_request_age_ms ({max_age}) is shorter than service_duration_ms ({service})")]
    SweepBeforeService { max_age: u64, service: u64 },

    #[error("client_population must be greater than zero when set")]
    EmptyClientPopulation,

    #[error("client_population {0} exceeds the {max} distinct client addresses", max = MAX_CLIENT_POPULATION)]
    ClientPopulationTooLarge(u32),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
    }

    let mut seen = HashSet::new();
    for (i, server) in config.servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServerName(i));
        } else if !seen.insert(server.name.as_str()) {
            errors.push(ValidationError::DuplicateServerName(server.name.clone()));
        }
        if server.capacity == 0 {
            errors.push(ValidationError::ZeroCapacity(server.name.clone()));
        }
        if server.weight == 0 {
            errors.push(ValidationError::ZeroWeight(server.name.clone()));
        }
    }

    let sim = &config.simulation;
    if sim.tick_interval_ms == 0 {
        errors.push(ValidationError::ZeroValue("tick_interval_ms"));
    }
    if sim.service_duration_ms == 0 {
        errors.push(ValidationError::ZeroValue("service_duration_ms"));
    }
    if sim.history_len == 0 {
        errors.push(ValidationError::ZeroValue("history_len"));
    }
    if sim.driver_resolution_ms == 0 {
        errors.push(ValidationError::ZeroValue("driver_resolution_ms"));
    }
    if sim.max_request_age_ms < sim.service_duration_ms {
        errors.push(ValidationError::SweepBeforeService {
            max_age: sim.max_request_age_ms,
            service: sim.service_duration_ms,
        });
    }
    match sim.client_population {
        Some(0) => errors.push(ValidationError::EmptyClientPopulation),
        Some(n) if n > MAX_CLIENT_POPULATION => {
            errors.push(ValidationError::ClientPopulationTooLarge(n))
        }
        _ => {}
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
