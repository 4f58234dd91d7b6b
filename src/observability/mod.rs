//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Core components produce:
//!     → tracing events (decisions, completions, commands)
//!     → metrics.rs (counters and per-server gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, filtered by RUST_LOG or config)
//!     → Prometheus exporter (optional, metrics_enabled)
//! ```
//!
//! # Design Decisions
//! - Metric calls are no-ops until a recorder is installed
//! - Per-decision events log at debug, commands at info

pub mod logging;
pub mod metrics;
