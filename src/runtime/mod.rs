//! Real-time runtime.
//!
//! # Data Flow
//! ```text
//! tokio interval (driver_resolution_ms)
//!     → SimulationHandle::advance_by(resolution)
//!     → due completions and ticks run on virtual time
//!
//! Shutdown::trigger()
//!     → every subscribed loop exits after its current frame
//! ```

pub mod driver;
pub mod shutdown;

pub use driver::SimulationDriver;
pub use shutdown::Shutdown;
