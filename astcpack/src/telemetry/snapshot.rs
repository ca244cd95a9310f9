//! Point-in-time copy of session counters.

use std::fmt;

/// Snapshot of [`SessionMetrics`](super::SessionMetrics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub contexts_built: u64,
    pub contexts_released: u64,
    pub contexts_reused: u64,
    pub context_failures: u64,
    pub compressions: u64,
    pub compressions_failed: u64,
    pub jobs_dispatched: u64,
    pub jobs_failed: u64,
    pub resets_failed: u64,
    pub bytes_written: u64,
}

impl MetricsSnapshot {
    /// Number of compression calls that succeeded.
    pub fn compressions_succeeded(&self) -> u64 {
        self.compressions.saturating_sub(self.compressions_failed)
    }

    /// Fraction of context requests served by an existing context.
    pub fn reuse_ratio(&self) -> f64 {
        let requests = self.contexts_built + self.contexts_reused;
        if requests == 0 {
            return 0.0;
        }
        self.contexts_reused as f64 / requests as f64
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} compressions ({} failed), {} contexts built, {} reused, {} jobs dispatched",
            self.compressions,
            self.compressions_failed,
            self.contexts_built,
            self.contexts_reused,
            self.jobs_dispatched
        )
    }
}
