//! Session telemetry.
//!
//! Lock-free atomic counters recording what the context manager and the
//! dispatcher did, plus a point-in-time snapshot for reporting.
//!
//! ```text
//! ContextManager ─┐
//!                 ├──► SessionMetrics ───► MetricsSnapshot ───► CLI, tests
//! EncoderSession ─┘    (atomic counters)   (plain copy)
//! ```
//!
//! # Example
//!
//! ```
//! use astcpack::telemetry::SessionMetrics;
//!
//! let metrics = SessionMetrics::new();
//! metrics.context_built();
//! metrics.context_reused();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.contexts_built, 1);
//! assert_eq!(snapshot.contexts_reused, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SessionMetrics;
pub use snapshot::MetricsSnapshot;
