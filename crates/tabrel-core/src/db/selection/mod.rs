//! Module: db::selection
//! Responsibility: the root (non-grouped) selection a manager hands out and
//! the relation node tree grouped selections hang off.
//! Does not own: batching or partitioning of grouped results.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        Row, Session,
        cache::{AncestorPath, RelationCache, SharedRelationCache},
        entity::Entity,
        executor::InsertOutcome,
        grouped::{GroupedSelection, distinct_keys},
        query::{AggregateExpr, AggregateFunction, Condition, SelectItem, SelectQuery},
    },
    error::InternalError,
    value::Value,
};
use std::{cell::RefCell, rc::Rc};

///
/// RelationNode
///
/// Position of a selection in a relation hierarchy: either the root
/// collection, or a grouped child of another node.
///

#[derive(Debug, Eq, PartialEq)]
pub enum RelationNode {
    Root {
        table: String,
    },
    Grouped {
        table: String,
        parent: Rc<Self>,
    },
}

impl RelationNode {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Root { table } | Self::Grouped { table, .. } => table,
        }
    }

    /// Own relation name followed by each grouped ancestor's, stopping at the
    /// root.
    #[must_use]
    pub fn ancestor_path(&self) -> AncestorPath {
        let mut names = Vec::new();
        let mut node = self;

        while let Self::Grouped { table, parent } = node {
            names.push(table.as_str());
            node = parent;
        }

        AncestorPath::from_names(names)
    }

    /// Number of grouped levels between this node and the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Root { .. } => 0,
            Self::Grouped { parent, .. } => parent.depth() + 1,
        }
    }
}

///
/// InsertData
///
/// One row or a list of rows handed to an insert.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InsertData {
    One(Row),
    Many(Vec<Row>),
}

impl InsertData {
    /// Set `column` to `value` on every row.
    pub(crate) fn stamp(&mut self, column: &str, value: &Value) {
        match self {
            Self::One(row) => {
                row.insert(column, value.clone());
            }
            Self::Many(rows) => {
                for row in rows {
                    row.insert(column, value.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::One(row) => vec![row],
            Self::Many(rows) => rows,
        }
    }
}

impl From<Row> for InsertData {
    fn from(row: Row) -> Self {
        Self::One(row)
    }
}

impl From<Vec<Row>> for InsertData {
    fn from(rows: Vec<Row>) -> Self {
        Self::Many(rows)
    }
}

///
/// Selection
///
/// Filterable, sortable collection over one table. Rows are fetched lazily
/// and kept until the query changes. Clones share the relation cache of
/// every grouped selection derived from them.
///

#[derive(Clone)]
pub struct Selection {
    session: Session,
    node: Rc<RelationNode>,
    query: SelectQuery,
    row_kind: Option<String>,
    rows: Option<Rc<Vec<Row>>>,
    cache: SharedRelationCache,
}

impl Selection {
    pub(crate) fn new(session: Session, table: impl Into<String>) -> Self {
        let table = table.into();

        Self {
            session,
            query: SelectQuery::new(table.clone()),
            node: Rc::new(RelationNode::Root { table }),
            row_kind: None,
            rows: None,
            cache: Rc::new(RefCell::new(RelationCache::default())),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.query.table()
    }

    #[must_use]
    pub const fn query(&self) -> &SelectQuery {
        &self.query
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Relation cache shared with grouped descendants.
    #[must_use]
    pub const fn cache(&self) -> &SharedRelationCache {
        &self.cache
    }

    /// Entity kind for rows of this selection, overriding settings.
    pub fn set_row_kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.row_kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn row_kind(&self) -> Option<&str> {
        self.row_kind.as_deref()
    }

    //
    // Builder
    //

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.where_condition(Condition::eq(column, value))
    }

    pub fn where_in(&mut self, column: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.where_condition(Condition::in_list(column, values))
    }

    pub fn where_condition(&mut self, condition: Condition) -> &mut Self {
        self.query.push_condition(condition);
        self.reset();
        self
    }

    /// Equality conditions for every `(column, value)` pair.
    pub fn where_all<K, V>(&mut self, conditions: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (column, value) in conditions {
            self.query.where_eq(column, value);
        }
        self.reset();
        self
    }

    pub fn select(&mut self, columns: &str) -> Result<&mut Self, InternalError> {
        self.query.select(columns)?;
        self.reset();
        Ok(self)
    }

    pub fn order(&mut self, expr: &str) -> Result<&mut Self, InternalError> {
        self.query.order(expr)?;
        self.reset();
        Ok(self)
    }

    pub fn limit(&mut self, limit: u32, offset: Option<u32>) -> &mut Self {
        self.query.set_limit(Some(limit), offset);
        self.reset();
        self
    }

    pub fn group(&mut self, column: impl Into<String>) -> &mut Self {
        self.query.group(column);
        self.reset();
        self
    }

    fn reset(&mut self) {
        self.rows = None;
    }

    //
    // Reads
    //

    /// Raw rows, executing the query on first access.
    pub fn rows(&mut self) -> Result<Rc<Vec<Row>>, InternalError> {
        if let Some(rows) = &self.rows {
            return Ok(Rc::clone(rows));
        }

        let rows = Rc::new(self.session.select(&self.query)?);
        self.rows = Some(Rc::clone(&rows));

        Ok(rows)
    }

    /// Rows materialized as entities.
    pub fn fetch(&mut self) -> Result<Vec<Box<dyn Entity>>, InternalError> {
        let rows = self.rows()?;

        rows.iter()
            .map(|row| self.instantiate(row.clone()))
            .collect()
    }

    /// Entity with the given primary key, or `None`.
    pub fn get(&self, key: impl Into<Value>) -> Result<Option<Box<dyn Entity>>, InternalError> {
        let primary = self.session.primary_key(self.table())?;

        let mut query = self.query.clone();
        query.where_eq(primary, key);
        query.set_limit(Some(1), None);

        match self.session.select(&query)?.into_iter().next() {
            Some(row) => self.instantiate(row).map(Some),
            None => Ok(None),
        }
    }

    /// Wrap a row in this selection's resolved entity kind.
    pub fn instantiate(&self, row: Row) -> Result<Box<dyn Entity>, InternalError> {
        self.session
            .instantiate(row, self.table(), self.row_kind.as_deref())
    }

    /// Single aggregate over this selection's conditions.
    pub fn aggregation(&self, function: &str) -> Result<Option<Value>, InternalError> {
        let expr = AggregateExpr::parse(function)?;
        self.aggregate(expr)
    }

    /// `COUNT(*)`, or `COUNT(column)` when given.
    pub fn count(&self, column: Option<&str>) -> Result<u64, InternalError> {
        let expr = match column {
            Some(column) => AggregateExpr::of(AggregateFunction::Count, column),
            None => AggregateExpr::count_all(),
        };

        Ok(self
            .aggregate(expr)?
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    fn aggregate(&self, expr: AggregateExpr) -> Result<Option<Value>, InternalError> {
        let mut query = SelectQuery::new(self.table());
        query.import_conditions(&self.query);
        query.push_select(SelectItem::Aggregate(expr));

        Ok(self
            .session
            .select(&query)?
            .into_iter()
            .next()
            .and_then(|row| row.first_value().cloned()))
    }

    //
    // Writes
    //

    pub fn insert(&self, data: impl Into<InsertData>) -> Result<InsertOutcome, InternalError> {
        let rows = data.into().into_rows();
        self.session.insert(self.table(), &rows)
    }

    /// Update every row matching this selection's conditions.
    pub fn update(&self, values: &Row) -> Result<u64, InternalError> {
        self.session.update(&self.query, values)
    }

    /// Delete every row matching this selection's conditions.
    pub fn delete(&self) -> Result<u64, InternalError> {
        self.session.delete(&self.query)
    }

    //
    // Relations
    //

    /// Grouped child selection over `table`, grouped by `column` and driven
    /// by the primary keys of this selection's rows.
    pub fn related(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Result<GroupedSelection, InternalError> {
        let primary = self.session.primary_key(self.table())?;
        let keys = distinct_keys(&self.rows()?, &primary);

        Ok(GroupedSelection::new(
            self.session.clone(),
            Rc::clone(&self.node),
            table.into(),
            column.into(),
            keys,
            Rc::clone(&self.cache),
        ))
    }
}
