//! Metrics sink boundary.
//!
//! This module is the only bridge between selection logic and the
//! thread-local counters.
use crate::obs::metrics::{self, EventReport};

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

///
/// CacheKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheKind {
    Referencing,
    Aggregation,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    Statement {
        kind: StatementKind,
        table: &'a str,
        rows: u64,
    },
    CacheLookup {
        cache: CacheKind,
        table: &'a str,
        hit: bool,
    },
    Partition {
        table: &'a str,
        retained: u64,
        dropped: u64,
    },
    Deprecated {
        table: &'a str,
        method: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
/// Used whenever a session has no sink installed.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Statement { kind, table, rows } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        StatementKind::Select => {
                            m.ops.select_calls = m.ops.select_calls.saturating_add(1);
                            m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows);
                        }
                        StatementKind::Insert => {
                            m.ops.insert_calls = m.ops.insert_calls.saturating_add(1);
                            m.ops.rows_written = m.ops.rows_written.saturating_add(rows);
                        }
                        StatementKind::Update => {
                            m.ops.update_calls = m.ops.update_calls.saturating_add(1);
                            m.ops.rows_written = m.ops.rows_written.saturating_add(rows);
                        }
                        StatementKind::Delete => {
                            m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                            m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows);
                        }
                    }

                    let entry = m.tables.entry(table.to_string()).or_default();
                    match kind {
                        StatementKind::Select => {
                            entry.select_calls = entry.select_calls.saturating_add(1);
                            entry.rows_loaded = entry.rows_loaded.saturating_add(rows);
                        }
                        StatementKind::Insert => {
                            entry.insert_calls = entry.insert_calls.saturating_add(1);
                        }
                        StatementKind::Update => {
                            entry.update_calls = entry.update_calls.saturating_add(1);
                        }
                        StatementKind::Delete => {
                            entry.delete_calls = entry.delete_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::CacheLookup { cache, table, hit } => {
                metrics::with_state_mut(|m| {
                    let entry = m.tables.entry(table.to_string()).or_default();
                    match (cache, hit) {
                        (CacheKind::Referencing, true) => {
                            m.ops.referencing_hits = m.ops.referencing_hits.saturating_add(1);
                            entry.referencing_hits = entry.referencing_hits.saturating_add(1);
                        }
                        (CacheKind::Referencing, false) => {
                            m.ops.referencing_misses = m.ops.referencing_misses.saturating_add(1);
                            entry.referencing_misses = entry.referencing_misses.saturating_add(1);
                        }
                        (CacheKind::Aggregation, true) => {
                            m.ops.aggregation_hits = m.ops.aggregation_hits.saturating_add(1);
                            entry.aggregation_hits = entry.aggregation_hits.saturating_add(1);
                        }
                        (CacheKind::Aggregation, false) => {
                            m.ops.aggregation_misses = m.ops.aggregation_misses.saturating_add(1);
                            entry.aggregation_misses = entry.aggregation_misses.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::Partition {
                table: _,
                retained,
                dropped,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_partitioned = m.ops.rows_partitioned.saturating_add(retained);
                    m.ops.rows_dropped = m.ops.rows_dropped.saturating_add(dropped);
                });
            }

            MetricsEvent::Deprecated { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.deprecated_calls = m.ops.deprecated_calls.saturating_add(1);
                });
            }
        }
    }
}

/// Snapshot the current thread's metrics.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

///
/// TESTS
///
