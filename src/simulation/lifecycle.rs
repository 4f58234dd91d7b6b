//! Request lifecycle tracking.
//!
//! # States
//! ```text
//! Admitted → Completed
//! ```
//! A record exists only while its request is admitted. Completion removes
//! it, so whichever of the service timer and the safety sweep reaches a
//! record first releases its load; the other finds nothing.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::load_balancer::server::ServerId;

/// Identifier assigned at admission, unique for the process lifetime.
pub type RequestId = u64;

/// An admitted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub id: RequestId,
    pub target: ServerId,
    pub client_id: String,
    pub admitted_at_ms: u64,
}

/// Tracks in-flight requests and their completion timers.
#[derive(Debug)]
pub struct RequestLifecycle {
    service_ms: u64,
    next_id: RequestId,
    in_flight: HashMap<RequestId, Request>,
    // Min-heap on (due time, id)
    timers: BinaryHeap<Reverse<(u64, RequestId)>>,
}

impl RequestLifecycle {
    pub fn new(service_ms: u64) -> Self {
        Self {
            service_ms,
            next_id: 1,
            in_flight: HashMap::new(),
            timers: BinaryHeap::new(),
        }
    }

    /// Record an admission and schedule its completion at `now + service`.
    pub fn admit(&mut self, target: ServerId, client_id: String, now_ms: u64) -> Request {
        let id = self.next_id;
        self.next_id += 1;

        let request = Request {
            id,
            target,
            client_id,
            admitted_at_ms: now_ms,
        };
        self.in_flight.insert(id, request.clone());
        self.timers.push(Reverse((now_ms + self.service_ms, id)));
        request
    }

    /// Earliest pending timer, if any. May belong to an already swept record.
    pub fn next_due(&self) -> Option<u64> {
        self.timers.peek().map(|Reverse((due, _))| *due)
    }

    /// Fire every timer due at or before `now_ms`, returning the requests
    /// that completed. Timers whose record is gone are discarded.
    pub fn fire_due(&mut self, now_ms: u64) -> Vec<Request> {
        let mut completed = Vec::new();
        while let Some(Reverse((due, id))) = self.timers.peek().copied() {
            if due > now_ms {
                break;
            }
            self.timers.pop();
            if let Some(request) = self.in_flight.remove(&id) {
                completed.push(request);
            }
        }
        completed
    }

    /// Remove records older than `max_age_ms`. Returned requests have not
    /// been released yet; the caller owns that single release.
    pub fn sweep(&mut self, now_ms: u64, max_age_ms: u64) -> Vec<Request> {
        let stale: Vec<RequestId> = self
            .in_flight
            .values()
            .filter(|r| now_ms.saturating_sub(r.admitted_at_ms) > max_age_ms)
            .map(|r| r.id)
            .collect();

        let mut swept: Vec<Request> = stale
            .into_iter()
            .filter_map(|id| self.in_flight.remove(&id))
            .collect();
        swept.sort_by_key(|r| r.id);
        swept
    }

    /// Drop all records and timers.
    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.timers.clear();
    }

    /// Number of admitted requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Admitted requests ordered by id.
    pub fn requests(&self) -> Vec<Request> {
        let mut requests: Vec<Request> = self.in_flight.values().cloned().collect();
        requests.sort_by_key(|r| r.id);
        requests
    }
}
