use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for one thread.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) tables: BTreeMap<String, TableCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Executor statements
    pub select_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_written: u64,
    pub rows_deleted: u64,

    // Grouped caches
    pub referencing_hits: u64,
    pub referencing_misses: u64,
    pub aggregation_hits: u64,
    pub aggregation_misses: u64,

    // Partitioning
    pub rows_partitioned: u64,
    pub rows_dropped: u64,

    pub deprecated_calls: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub select_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub rows_loaded: u64,
    pub referencing_hits: u64,
    pub referencing_misses: u64,
    pub aggregation_hits: u64,
    pub aggregation_misses: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
/// Point-in-time snapshot of the counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub tables: Vec<TableSummary>,
}

impl EventReport {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableCounters> {
        self.tables
            .iter()
            .find(|summary| summary.table == name)
            .map(|summary| &summary.counters)
    }
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub counters: TableCounters,
}

pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport {
        ops: m.ops.clone(),
        tables: m
            .tables
            .iter()
            .map(|(table, counters)| TableSummary {
                table: table.clone(),
                counters: counters.clone(),
            })
            .collect(),
    })
}
