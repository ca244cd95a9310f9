//! Atomic counters for an encoder session.

use std::sync::atomic::{AtomicU64, Ordering};

use super::MetricsSnapshot;

/// Counters shared by the context manager and the dispatcher.
///
/// All counters only ever increase. Relaxed ordering is enough because the
/// counters are independent of each other and only read for reporting.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    contexts_built: AtomicU64,
    contexts_released: AtomicU64,
    contexts_reused: AtomicU64,
    context_failures: AtomicU64,
    compressions: AtomicU64,
    compressions_failed: AtomicU64,
    jobs_dispatched: AtomicU64,
    jobs_failed: AtomicU64,
    resets_failed: AtomicU64,
    bytes_written: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new context became current.
    pub fn context_built(&self) {
        self.contexts_built.fetch_add(1, Ordering::Relaxed);
    }

    /// A context was freed.
    pub fn context_released(&self) {
        self.contexts_released.fetch_add(1, Ordering::Relaxed);
    }

    /// The current context already matched the requested geometry.
    pub fn context_reused(&self) {
        self.contexts_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Configuration, allocation or worker startup failed.
    pub fn context_failed(&self) {
        self.context_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A compression call finished successfully.
    pub fn compression_succeeded(&self, jobs: usize, bytes: usize) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
        self.jobs_dispatched.fetch_add(jobs as u64, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// A compression call failed after its jobs were dispatched.
    pub fn compression_failed(&self, jobs: usize, failed_jobs: usize) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
        self.compressions_failed.fetch_add(1, Ordering::Relaxed);
        self.jobs_dispatched.fetch_add(jobs as u64, Ordering::Relaxed);
        self.jobs_failed.fetch_add(failed_jobs as u64, Ordering::Relaxed);
    }

    /// A compression call failed before any job was dispatched.
    pub fn compression_rejected(&self) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
        self.compressions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Resetting the context after a call failed.
    pub fn reset_failed(&self) {
        self.resets_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of contexts currently alive (0 or 1).
    pub fn live_contexts(&self) -> u64 {
        let built = self.contexts_built.load(Ordering::Relaxed);
        let released = self.contexts_released.load(Ordering::Relaxed);
        built.saturating_sub(released)
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            contexts_built: self.contexts_built.load(Ordering::Relaxed),
            contexts_released: self.contexts_released.load(Ordering::Relaxed),
            contexts_reused: self.contexts_reused.load(Ordering::Relaxed),
            context_failures: self.context_failures.load(Ordering::Relaxed),
            compressions: self.compressions.load(Ordering::Relaxed),
            compressions_failed: self.compressions_failed.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            resets_failed: self.resets_failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
