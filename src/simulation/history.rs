//! Bounded load history for charting.

use std::collections::VecDeque;

use serde::Serialize;

/// Per-server loads captured at the start of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySample {
    /// Tick number (1-based) the sample was taken in.
    pub tick: u64,
    /// Virtual time of the sample.
    pub at_ms: u64,
    /// Loads in pool order.
    pub loads: Vec<u32>,
}

/// Fixed-capacity ring of samples. The oldest sample is evicted on overflow.
#[derive(Debug, Clone)]
pub struct LoadHistory {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl LoadHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples ordered oldest to newest.
    pub fn snapshot(&self) -> Vec<HistorySample> {
        self.samples.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
