//! Simulation subsystem.
//!
//! # Data Flow
//! ```text
//! clock.rs tick due
//!     → history.rs (append per-server loads)
//!     → clients.rs (synthetic client id)
//!     → load_balancer::RoutingEngine (select target)
//!     → Routed: pool.increment_load + lifecycle.rs admit (timer at now + service)
//!     → NoCapacity: drop event, no mutation
//!
//! lifecycle.rs timer due
//!     → pool.decrement_load (exactly once per request)
//! ```
//!
//! # Design Decisions
//! - Virtual time: timers live in a min-heap, nothing sleeps
//! - Policy change and reset stop the clock and clear all state
//! - Commands go through the same `&mut Simulation` as ticks, so they
//!   always land between ticks

pub mod clients;
pub mod clock;
pub mod events;
pub mod handle;
pub mod history;
pub mod lifecycle;
pub mod simulator;

pub use clock::ClockState;
pub use events::SimEvent;
pub use handle::SimulationHandle;
pub use history::HistorySample;
pub use lifecycle::{Request, RequestId};
pub use simulator::{SimStats, Simulation, TickReport};
