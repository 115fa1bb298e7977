use crate::{
    db::{Row, query::SelectQuery},
    error::InternalError,
    value::Value,
};

///
/// InsertOutcome
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InsertOutcome {
    /// Number of rows written.
    pub affected: u64,

    /// Primary key generated for (or supplied with) the last inserted row.
    pub last_id: Option<Value>,
}

///
/// QueryExecutor
///
/// The query-execution collaborator: SQL dialects, transport, transactions
/// and schema reflection all live behind this trait. Every call is blocking.
/// Errors are propagated to callers unchanged.
///

pub trait QueryExecutor {
    /// Execute a select and return rows in result order.
    fn select(&self, query: &SelectQuery) -> Result<Vec<Row>, InternalError>;

    /// Insert one or more rows into `table`.
    fn insert(&self, table: &str, rows: &[Row]) -> Result<InsertOutcome, InternalError>;

    /// Update rows matching `filter`'s conditions; returns affected rows.
    fn update(&self, filter: &SelectQuery, values: &Row) -> Result<u64, InternalError>;

    /// Delete rows matching `filter`'s conditions; returns affected rows.
    fn delete(&self, filter: &SelectQuery) -> Result<u64, InternalError>;

    /// Resolve the primary-key column of `table`.
    fn primary_key(&self, table: &str) -> Result<String, InternalError>;
}
