//! Discrete simulation clock.
//!
//! # States
//! ```text
//! Stopped --start()--> Running --stop()--> Stopped
//! ```
//! Virtual time only moves forward. While running, a tick is due every
//! `interval_ms`; the first one lands one interval after `start()`.

use serde::Serialize;

/// Whether ticks are being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Stopped,
    Running,
}

/// Virtual timeline with a fixed tick interval.
#[derive(Debug)]
pub struct SimulationClock {
    state: ClockState,
    interval_ms: u64,
    now_ms: u64,
    next_tick_ms: Option<u64>,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            state: ClockState::Stopped,
            interval_ms,
            now_ms: 0,
            next_tick_ms: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Virtual time of the next tick, or `None` while stopped.
    pub fn next_tick_at(&self) -> Option<u64> {
        self.next_tick_ms
    }

    /// Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ClockState::Running;
        self.next_tick_ms = Some(self.now_ms + self.interval_ms);
        true
    }

    /// Returns `false` if already stopped. Pending ticks are cancelled.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ClockState::Stopped;
        self.next_tick_ms = None;
        true
    }

    /// Move virtual time forward. Earlier times are ignored.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Consume the due tick and schedule the next one. Returns the tick number.
    pub fn begin_tick(&mut self) -> u64 {
        if let Some(at) = self.next_tick_ms {
            self.next_tick_ms = Some(at + self.interval_ms);
        }
        self.ticks += 1;
        self.ticks
    }

    /// Restart tick numbering. Time keeps its value.
    pub fn reset_ticks(&mut self) {
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let mut clock = SimulationClock::new(100);
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.next_tick_at(), None);

        assert!(clock.start());
        assert!(!clock.start());
        assert_eq!(clock.next_tick_at(), Some(100));

        assert!(clock.stop());
        assert!(!clock.stop());
        assert_eq!(clock.next_tick_at(), None);
    }

    #[test]
    fn test_ticks_schedule_forward() {
        let mut clock = SimulationClock::new(50);
        clock.set_now(20);
        clock.start();
        assert_eq!(clock.next_tick_at(), Some(70));

        clock.set_now(70);
        assert_eq!(clock.begin_tick(), 1);
        assert_eq!(clock.next_tick_at(), Some(120));
    }

    #[test]
    fn test_time_is_monotonic() {
        let mut clock = SimulationClock::new(10);
        clock.set_now(30);
        clock.set_now(5);
        assert_eq!(clock.now_ms(), 30);
    }
}
