//! System-wide counters shared by the façade and every loop thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// System-wide metrics
#[derive(Debug, Default)]
pub struct SystemMetrics {
    pub actors_spawned: AtomicU64,
    pub actors_stopped: AtomicU64,
    pub messages_enqueued: AtomicU64,
    pub messages_processed: AtomicU64,
    /// Envelopes left behind a termination signal
    pub messages_discarded: AtomicU64,
    pub dead_letters: AtomicU64,
    pub require_timeouts: AtomicU64,
    pub total_processing_time_ns: AtomicU64,
}

impl SystemMetrics {
    pub fn record_spawned(&self) {
        self.actors_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stopped(&self) {
        self.actors_stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.messages_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_handled(&self, duration: Duration) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_discarded(&self, count: u64) {
        self.messages_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_dead_letter(&self) {
        self.dead_letters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.require_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.messages_processed.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_processing_time_ns.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    /// Get a point-in-time copy of every counter
    pub fn snapshot(&self) -> SystemStats {
        SystemStats {
            actors_spawned: self.actors_spawned.load(Ordering::Relaxed),
            actors_stopped: self.actors_stopped.load(Ordering::Relaxed),
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            messages_discarded: self.messages_discarded.load(Ordering::Relaxed),
            dead_letters: self.dead_letters.load(Ordering::Relaxed),
            require_timeouts: self.require_timeouts.load(Ordering::Relaxed),
            avg_processing_time_ns: self.avg_processing_time_ns(),
        }
    }
}

/// Basic system statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub actors_spawned: u64,
    pub actors_stopped: u64,
    pub messages_enqueued: u64,
    pub messages_processed: u64,
    pub messages_discarded: u64,
    pub dead_letters: u64,
    pub require_timeouts: u64,
    pub avg_processing_time_ns: f64,
}
