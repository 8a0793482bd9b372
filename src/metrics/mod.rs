pub mod logger;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use parking_lot::RwLock;

/// Finished-transmission rows kept until someone takes them; the oldest go first.
pub const MAX_RETAINED_RECORDS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_s: f64,
    pub transmissions_submitted: u64,
    pub transmissions_rejected: u64,
    pub transmissions_completed: u64,
    pub transmissions_aborted: u64,
    pub hops_advanced: u64,
    pub pings: u64,
    pub consistency_faults: u64,
    pub avg_hops_per_transmission: f64,
}

/// One row per finished (completed or aborted) transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionRecord {
    pub request_id: u64,
    pub protocol: String,
    pub source: String,
    pub destination: String,
    pub path_len: usize,
    pub hops_walked: u64,
    pub outcome: String,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct MetricsInner {
    transmissions_submitted: u64,
    transmissions_rejected: u64,
    transmissions_completed: u64,
    transmissions_aborted: u64,
    hops_advanced: u64,
    pings: u64,
    consistency_faults: u64,
    records: VecDeque<TransmissionRecord>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner::default())),
            start_time: Instant::now(),
        }
    }

    pub fn transmission_submitted(&self) {
        self.inner.write().transmissions_submitted += 1;
    }

    pub fn transmission_rejected(&self) {
        self.inner.write().transmissions_rejected += 1;
    }

    pub fn hop_advanced(&self) {
        self.inner.write().hops_advanced += 1;
    }

    pub fn ping(&self) {
        self.inner.write().pings += 1;
    }

    pub fn consistency_fault(&self) {
        self.inner.write().consistency_faults += 1;
    }

    pub fn transmission_finished(&self, record: TransmissionRecord, completed: bool) {
        let mut inner = self.inner.write();
        if completed {
            inner.transmissions_completed += 1;
        } else {
            inner.transmissions_aborted += 1;
        }
        if inner.records.len() == MAX_RETAINED_RECORDS {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read();

        let finished = inner.transmissions_completed + inner.transmissions_aborted;
        let avg_hops_per_transmission = if finished > 0 {
            inner.hops_advanced as f64 / finished as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            uptime_s: self.start_time.elapsed().as_secs_f64(),
            transmissions_submitted: inner.transmissions_submitted,
            transmissions_rejected: inner.transmissions_rejected,
            transmissions_completed: inner.transmissions_completed,
            transmissions_aborted: inner.transmissions_aborted,
            hops_advanced: inner.hops_advanced,
            pings: inner.pings,
            consistency_faults: inner.consistency_faults,
            avg_hops_per_transmission,
        }
    }

    pub fn records(&self) -> Vec<TransmissionRecord> {
        self.inner.read().records.iter().cloned().collect()
    }

    /// Hands over every retained record, oldest first, and forgets them.
    pub fn take_records(&self) -> Vec<TransmissionRecord> {
        self.inner.write().records.drain(..).collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
