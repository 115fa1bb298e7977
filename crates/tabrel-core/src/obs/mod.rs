//! Observability: runtime counters and the sink abstraction.
//!
//! Selections and managers never touch the counters directly; every
//! instrumentation point emits a `MetricsEvent` through the session's sink.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, TableCounters, TableSummary};
pub use sink::{
    CacheKind, GlobalMetricsSink, MetricsEvent, MetricsSink, StatementKind, metrics_report,
    metrics_reset_all,
};
