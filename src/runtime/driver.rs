//! Wall-clock driver for a simulation.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::simulation::SimulationHandle;

/// Advances a simulation's virtual time in step with real time.
pub struct SimulationDriver {
    handle: SimulationHandle,
    resolution: Duration,
}

impl SimulationDriver {
    pub fn new(handle: SimulationHandle, resolution_ms: u64) -> Self {
        Self {
            handle,
            resolution: Duration::from_millis(resolution_ms.max(1)),
        }
    }

    /// Run until the shutdown signal arrives.
    ///
    /// Each frame moves virtual time to the wall-clock time elapsed since the
    /// driver started, so late frames catch up in one step. Virtual time
    /// advances while stopped too, so in-flight requests keep completing
    /// after `stop()`.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(resolution_ms = self.resolution.as_millis() as u64, "Simulation driver starting");

        let origin = Instant::now();
        let base_ms = self.handle.now_ms();
        let mut ticker = time::interval_at(origin + self.resolution, self.resolution);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed_ms = origin.elapsed().as_millis() as u64;
                    let reports = self.handle.advance_to(base_ms + elapsed_ms);
                    for report in reports {
                        tracing::info!(tick = report.tick, at_ms = report.at_ms, "{}", report.decision.message);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Simulation driver received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::runtime::Shutdown;
    use crate::simulation::Simulation;

    fn handle() -> SimulationHandle {
        let mut config = SimConfig::default();
        config.simulation.tick_interval_ms = 100;
        config.simulation.service_duration_ms = 150;
        config.simulation.seed = Some(3);
        SimulationHandle::new(Simulation::new(&config).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_ticks_in_real_time() {
        let handle = handle();
        let shutdown = Shutdown::new();
        let driver = SimulationDriver::new(handle.clone(), 10);
        let task = tokio::spawn(driver.run(shutdown.subscribe()));

        handle.start();
        time::sleep(Duration::from_millis(555)).await;
        shutdown.trigger();
        task.await.unwrap();

        let ticks = handle.stats().ticks;
        assert!((4..=5).contains(&ticks), "unexpected tick count {}", ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_virtual_time_follows_wall_clock() {
        let handle = handle();
        handle.advance_by(1_000);
        let shutdown = Shutdown::new();
        let task = tokio::spawn(SimulationDriver::new(handle.clone(), 25).run(shutdown.subscribe()));

        time::sleep(Duration::from_millis(510)).await;
        shutdown.trigger();
        task.await.unwrap();

        // Stopped clock: time still moves from where it was, one frame behind at most
        let now = handle.now_ms();
        assert!((1_475..=1_510).contains(&now), "unexpected virtual time {}", now);
        assert_eq!(handle.stats().ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_completes_after_stop() {
        let handle = handle();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(SimulationDriver::new(handle.clone(), 10).run(shutdown.subscribe()));

        handle.start();
        time::sleep(Duration::from_millis(205)).await;
        handle.stop();
        let stopped_at = handle.stats().ticks;
        assert!(stopped_at >= 1);

        time::sleep(Duration::from_millis(500)).await;
        shutdown.trigger();
        task.await.unwrap();

        assert_eq!(handle.stats().ticks, stopped_at);
        assert!(handle.pool_snapshot().servers.iter().all(|s| s.load == 0));
    }
}
