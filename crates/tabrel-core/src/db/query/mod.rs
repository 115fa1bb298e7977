//! Module: db::query
//! Responsibility: the select-query model handed to the executor, its
//! deterministic SQL rendering, and the query signature derived from it.
//! Does not own: execution, dialect-specific SQL, write statements.

mod order;
mod render;
mod select;
mod signature;


use crate::value::Value;
use thiserror::Error as ThisError;

// re-exports
pub use order::{OrderDirection, OrderTerm};
pub use select::{AggregateExpr, AggregateFunction, SelectItem};
pub use signature::QuerySignature;

///
/// QueryParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryParseError {
    #[error("empty query expression")]
    Empty,

    #[error("malformed query expression: '{0}'")]
    Malformed(String),

    #[error("unsupported aggregate function: '{0}'")]
    UnknownFunction(String),

    #[error("'{0}' is not an aggregate expression")]
    NotAggregate(String),

    #[error("invalid order direction '{direction}' in '{term}'")]
    InvalidDirection { term: String, direction: String },
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

///
/// Condition
///
/// One conjunct of a query's WHERE clause.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
}

impl Condition {
    /// Equality; comparing against NULL becomes `IS NULL`.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        match value.into() {
            Value::Null => Self::IsNull { column },
            value => Self::Compare {
                column,
                op: CompareOp::Eq,
                value,
            },
        }
    }

    #[must_use]
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Compare { column, .. }
            | Self::In { column, .. }
            | Self::IsNull { column }
            | Self::IsNotNull { column } => column,
        }
    }
}

///
/// SelectQuery
///
/// Filter/sort/limit description of one select against a named table.
/// Mutated in place by selections; cloned whenever a variant is needed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectQuery {
    table: String,
    select: Vec<SelectItem>,
    conditions: Vec<Condition>,
    group: Vec<String>,
    order: Vec<OrderTerm>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SelectQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: Vec::new(),
            conditions: Vec::new(),
            group: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn select_items(&self) -> &[SelectItem] {
        &self.select
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn group_by(&self) -> &[String] {
        &self.group
    }

    #[must_use]
    pub fn order_terms(&self) -> &[OrderTerm] {
        &self.order
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Append a comma-separated select list.
    pub fn select(&mut self, columns: &str) -> Result<(), QueryParseError> {
        let items = SelectItem::parse_list(columns)?;
        self.select.extend(items);
        Ok(())
    }

    pub fn push_select(&mut self, item: SelectItem) {
        self.select.push(item);
    }

    pub fn push_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Insert a condition ahead of all existing ones.
    pub fn prepend_condition(&mut self, condition: Condition) {
        self.conditions.insert(0, condition);
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.push_condition(Condition::eq(column, value));
    }

    pub fn where_in(&mut self, column: impl Into<String>, values: Vec<Value>) {
        self.push_condition(Condition::in_list(column, values));
    }

    /// Append a comma-separated order expression.
    pub fn order(&mut self, expr: &str) -> Result<(), QueryParseError> {
        let terms = OrderTerm::parse_list(expr)?;
        self.order.extend(terms);
        Ok(())
    }

    pub fn push_order(&mut self, term: OrderTerm) {
        self.order.push(term);
    }

    pub fn group(&mut self, column: impl Into<String>) {
        self.group.push(column.into());
    }

    pub const fn set_limit(&mut self, limit: Option<u32>, offset: Option<u32>) {
        self.limit = limit;
        self.offset = offset;
    }

    /// Copy another query's WHERE conditions onto this one.
    pub fn import_conditions(&mut self, other: &Self) {
        self.conditions.extend(other.conditions.iter().cloned());
    }

    /// Deterministic SQL text with `?` placeholders.
    #[must_use]
    pub fn build_select_query(&self) -> String {
        render::select_sql(self)
    }

    /// Bound parameters in placeholder order.
    #[must_use]
    pub fn parameters(&self) -> Vec<Value> {
        render::parameters(&self.conditions)
    }

    /// WHERE clause text (without the keyword) as used by write statements.
    #[must_use]
    pub fn build_where_clause(&self) -> Option<String> {
        render::where_sql(&self.conditions)
    }

    #[must_use]
    pub fn signature(&self) -> QuerySignature {
        QuerySignature::of(self)
    }
}

/// Strip a `table.` qualifier from a column reference.
#[must_use]
pub fn unqualified(column: &str) -> &str {
    column.rsplit_once('.').map_or(column, |(_, bare)| bare)
}

/// Qualify a bare column with its table name.
#[must_use]
pub fn qualify(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}
