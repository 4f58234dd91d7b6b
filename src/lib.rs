//! Load balancer simulator library.
//!
//! A fixed pool of simulated backends receives one synthetic request per
//! tick. A routing engine picks the target under one of four policies
//! (round robin, weighted round robin, least connections, IP-hash sticky
//! sessions); admitted requests hold a slot on their server for a fixed
//! service time on a virtual timeline.

pub mod config;
pub mod error;
pub mod load_balancer;
pub mod observability;
pub mod runtime;
pub mod simulation;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use load_balancer::server::{Server, ServerId};
pub use load_balancer::Policy;
pub use simulation::{Simulation, SimulationHandle};
