//! Module: db::memory
//! Responsibility: an in-process `QueryExecutor` over plain row vectors,
//! with a log of every statement it executed.
//! Does not own: SQL parsing; it evaluates `SelectQuery` values directly.

mod eval;

#[cfg(test)]
mod tests;

use crate::{
    db::{
        Row,
        executor::{InsertOutcome, QueryExecutor},
        query::{SelectQuery, unqualified},
    },
    error::InternalError,
    value::Value,
};
use std::{cell::RefCell, collections::BTreeMap};

///
/// MemoryTable
///

#[derive(Debug)]
struct MemoryTable {
    primary: String,
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryTable {
    fn new(primary: String) -> Self {
        Self {
            primary,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    // Missing or NULL primary keys are assigned from the table's counter.
    fn insert(&mut self, mut row: Row) -> Result<Value, InternalError> {
        let supplied = row
            .get(&self.primary)
            .filter(|key| !key.is_null())
            .cloned();
        let key = match supplied {
            Some(key) => key,
            None => {
                let key = Value::Int(self.next_id);
                row.insert(self.primary.as_str(), key.clone());
                key
            }
        };

        if let Some(id) = key.as_i64() {
            self.next_id = self.next_id.max(id.saturating_add(1));
        }

        if self
            .rows
            .iter()
            .any(|existing| existing.get(&self.primary) == Some(&key))
        {
            return Err(InternalError::executor_conflict(format!(
                "duplicate primary key {key} in '{}'",
                self.primary
            )));
        }

        self.rows.push(row);

        Ok(key)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    log: Vec<String>,
}

impl MemoryState {
    fn table(&self, name: &str) -> Result<&MemoryTable, InternalError> {
        self.tables
            .get(name)
            .ok_or_else(|| InternalError::unknown_table(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable, InternalError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| InternalError::unknown_table(name))
    }
}

///
/// MemoryExecutor
///
/// Tables live in process memory. Integer primary keys are generated when
/// an inserted row carries none.
///

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    state: RefCell<MemoryState>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty table keyed by `primary`.
    pub fn create_table(
        &self,
        table: impl Into<String>,
        primary: impl Into<String>,
    ) -> Result<(), InternalError> {
        let table = table.into();
        let mut state = self.state.borrow_mut();
        if state.tables.contains_key(&table) {
            return Err(InternalError::executor_conflict(format!(
                "table '{table}' already exists"
            )));
        }

        state.tables.insert(table, MemoryTable::new(primary.into()));

        Ok(())
    }

    /// Insert rows without logging a statement.
    pub fn seed(&self, table: &str, rows: Vec<Row>) -> Result<(), InternalError> {
        let mut state = self.state.borrow_mut();
        let table = state.table_mut(table)?;
        for row in rows {
            table.insert(row)?;
        }

        Ok(())
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, InternalError> {
        Ok(self.state.borrow().table(table)?.rows.clone())
    }

    /// Every statement executed so far, oldest first.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    /// Number of select statements executed so far.
    #[must_use]
    pub fn select_count(&self) -> usize {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|statement| statement.starts_with("SELECT"))
            .count()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }
}

impl QueryExecutor for MemoryExecutor {
    fn select(&self, query: &SelectQuery) -> Result<Vec<Row>, InternalError> {
        let mut state = self.state.borrow_mut();
        let rows = eval::select(&state.table(query.table())?.rows, query)?;
        state.log.push(query.build_select_query());

        Ok(rows)
    }

    fn insert(&self, table: &str, rows: &[Row]) -> Result<InsertOutcome, InternalError> {
        let mut state = self.state.borrow_mut();
        let target = state.table_mut(table)?;

        let mut outcome = InsertOutcome::default();
        for row in rows {
            outcome.last_id = Some(target.insert(row.clone())?);
            outcome.affected += 1;
        }

        state
            .log
            .push(format!("INSERT INTO {table} ({} rows)", rows.len()));

        Ok(outcome)
    }

    fn update(&self, filter: &SelectQuery, values: &Row) -> Result<u64, InternalError> {
        let mut state = self.state.borrow_mut();
        let target = state.table_mut(filter.table())?;

        let mut affected = 0;
        for row in &mut target.rows {
            if eval::matches_all(row, filter.conditions()) {
                for (column, value) in values {
                    row.insert(unqualified(column), value.clone());
                }
                affected += 1;
            }
        }

        let assignments = values
            .columns()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        state.log.push(with_where(
            format!("UPDATE {} SET {assignments}", filter.table()),
            filter,
        ));

        Ok(affected)
    }

    fn delete(&self, filter: &SelectQuery) -> Result<u64, InternalError> {
        let mut state = self.state.borrow_mut();
        let target = state.table_mut(filter.table())?;

        let before = target.rows.len();
        target
            .rows
            .retain(|row| !eval::matches_all(row, filter.conditions()));
        let affected = (before - target.rows.len()) as u64;

        state
            .log
            .push(with_where(format!("DELETE FROM {}", filter.table()), filter));

        Ok(affected)
    }

    fn primary_key(&self, table: &str) -> Result<String, InternalError> {
        Ok(self.state.borrow().table(table)?.primary.clone())
    }
}

fn with_where(statement: String, filter: &SelectQuery) -> String {
    match filter.build_where_clause() {
        Some(clause) => format!("{statement} WHERE {clause}"),
        None => statement,
    }
}
