//! Shared handle for driving and observing a simulation from several tasks.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::error::SimResult;
use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::server::ServerId;
use crate::load_balancer::Policy;
use crate::simulation::{ClockState, HistorySample, SimEvent, SimStats, Simulation, TickReport};

/// Cloneable wrapper around a locked [`Simulation`].
///
/// Every call takes the lock, so commands never interleave with a tick.
#[derive(Clone)]
pub struct SimulationHandle {
    inner: Arc<Mutex<Simulation>>,
}

impl SimulationHandle {
    pub fn new(simulation: Simulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulation)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.inner.lock().expect("simulation mutex poisoned")
    }

    /// Run a closure with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn set_policy(&self, policy: Policy) {
        self.lock().set_policy(policy);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn toggle_availability(&self, id: ServerId) -> SimResult<bool> {
        self.lock().toggle_availability(id)
    }

    pub fn advance_to(&self, target_ms: u64) -> Vec<TickReport> {
        self.lock().advance_to(target_ms)
    }

    pub fn advance_by(&self, delta_ms: u64) -> Vec<TickReport> {
        self.lock().advance_by(delta_ms)
    }

    pub fn now_ms(&self) -> u64 {
        self.lock().now_ms()
    }

    pub fn pool_snapshot(&self) -> PoolSnapshot {
        self.lock().pool_snapshot()
    }

    pub fn history_snapshot(&self) -> Vec<HistorySample> {
        self.lock().history_snapshot()
    }

    pub fn last_decision_message(&self) -> String {
        self.lock().last_decision_message().to_string()
    }

    pub fn policy(&self) -> Policy {
        self.lock().policy()
    }

    pub fn state(&self) -> ClockState {
        self.lock().state()
    }

    pub fn stats(&self) -> SimStats {
        self.lock().stats()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.lock().subscribe()
    }
}

impl std::fmt::Debug for SimulationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn test_handle_shares_state() {
        let handle = SimulationHandle::new(Simulation::new(&SimConfig::default()).unwrap());
        let other = handle.clone();

        handle.start();
        assert_eq!(other.state(), ClockState::Running);

        let interval = handle.with(|s| s.settings().tick_interval_ms);
        other.advance_by(interval * 3);
        assert_eq!(handle.stats().ticks, 3);
        assert_eq!(handle.history_snapshot().len(), 3);

        other.set_policy(Policy::IpHash);
        assert_eq!(handle.policy(), Policy::IpHash);
        assert_eq!(handle.state(), ClockState::Stopped);
    }
}
