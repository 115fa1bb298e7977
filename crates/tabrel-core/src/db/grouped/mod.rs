//! Module: db::grouped
//! Responsibility: one-to-many sub-selections that serve every sibling group
//! from a single batched query.
//! Does not own: cache storage (see `db::cache`) or query rendering.
//!
//! A grouped selection is driven by the primary keys of its parent's rows.
//! The first read of any group runs one query for all of them, partitions
//! the result by grouping column and stores the partition in the relation
//! cache shared with the root selection. Every later read of any sibling
//! group with the same query shape is served from that partition.


use crate::{
    db::{
        Row, Session,
        cache::{
            AggregationEntry, AggregationKey, CacheKey, GroupWindow, ReferencingEntry,
            SharedRelationCache,
        },
        entity::Entity,
        executor::InsertOutcome,
        query::{
            AggregateExpr, AggregateFunction, Condition, OrderDirection, OrderTerm, SelectItem,
            SelectQuery, qualify,
        },
        selection::{InsertData, RelationNode},
    },
    error::InternalError,
    obs::{CacheKind, MetricsEvent},
    value::Value,
};
use std::{collections::HashSet, rc::Rc};
use tracing::{debug, warn};

///
/// GroupedSelection
///

#[derive(Clone)]
pub struct GroupedSelection {
    session: Session,
    node: Rc<RelationNode>,
    column: String,
    query: SelectQuery,
    parent_keys: Rc<Vec<Value>>,
    active: Option<Value>,
    row_kind: Option<String>,
    cache: SharedRelationCache,
    data: Option<Rc<ReferencingEntry>>,
}

impl GroupedSelection {
    pub(crate) fn new(
        session: Session,
        parent: Rc<RelationNode>,
        table: String,
        column: String,
        parent_keys: Vec<Value>,
        cache: SharedRelationCache,
    ) -> Self {
        Self {
            session,
            query: SelectQuery::new(table.clone()),
            node: Rc::new(RelationNode::Grouped { table, parent }),
            column,
            parent_keys: Rc::new(parent_keys),
            active: None,
            row_kind: None,
            cache,
            data: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.query.table()
    }

    /// Grouping column, unqualified.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn node(&self) -> &Rc<RelationNode> {
        &self.node
    }

    /// Group keys of every sibling group.
    #[must_use]
    pub fn parent_keys(&self) -> &[Value] {
        &self.parent_keys
    }

    #[must_use]
    pub const fn active(&self) -> Option<&Value> {
        self.active.as_ref()
    }

    /// Choose the group subsequent reads and writes apply to.
    pub fn set_active(&mut self, key: impl Into<Value>) -> &mut Self {
        self.active = Some(key.into());
        self
    }

    /// Sibling handle with `key` active; shares this selection's partition.
    #[must_use]
    pub fn for_group(&self, key: impl Into<Value>) -> Self {
        let mut sibling = self.clone();
        sibling.set_active(key);
        sibling
    }

    pub fn set_row_kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.row_kind = Some(kind.into());
        self
    }

    /// Override the grouping column after construction.
    #[deprecated(note = "pass the grouping column to `related` instead")]
    pub fn through(&mut self, column: impl Into<String>) -> &mut Self {
        let column = column.into();
        warn!(
            table = self.table(),
            column = %column,
            "through() is deprecated; pass the grouping column to related()"
        );
        self.session.record(MetricsEvent::Deprecated {
            table: self.table(),
            method: "through",
        });

        self.column = column;
        self.reset();
        self
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

    /// Append to the select list; the first call puts the grouping column
    /// in front.
    pub fn select(&mut self, columns: &str) -> Result<&mut Self, InternalError> {
        let items = SelectItem::parse_list(columns)?;

        if self.query.select_items().is_empty() {
            self.query
                .push_select(SelectItem::Column(self.grouping_column()));
        }
        for item in items {
            self.query.push_select(item);
        }

        self.reset();
        Ok(self)
    }

    /// Append to the order clause; the first call orders by the grouping
    /// column first, in the direction of the expression's last term.
    pub fn order(&mut self, expr: &str) -> Result<&mut Self, InternalError> {
        let terms = OrderTerm::parse_list(expr)?;

        if self.query.order_terms().is_empty() {
            let direction = terms
                .last()
                .map_or(OrderDirection::Asc, |term| term.direction);
            self.query.push_order(OrderTerm {
                column: self.grouping_column(),
                direction,
            });
        }
        for term in terms {
            self.query.push_order(term);
        }

        self.reset();
        Ok(self)
    }

    /// Per-group limit and offset.
    pub fn limit(&mut self, limit: u32, offset: Option<u32>) -> &mut Self {
        self.query.set_limit(Some(limit), offset);
        self.reset();
        self
    }

    fn reset(&mut self) {
        self.data = None;
    }

    fn grouping_column(&self) -> String {
        qualify(self.table(), &self.column)
    }

    /// The query covering every sibling group.
    #[must_use]
    pub fn batched_query(&self) -> SelectQuery {
        let mut query = self.query.clone();
        query.prepend_condition(Condition::in_list(
            self.grouping_column(),
            self.parent_keys.to_vec(),
        ));

        query
    }

    fn active_key(&self) -> Result<&Value, InternalError> {
        self.active.as_ref().ok_or_else(|| {
            InternalError::query_invariant(format!(
                "grouped selection over '{}' has no active group",
                self.table()
            ))
        })
    }

    // With a single sibling group the limit stays in the query itself.
    fn window(&self, query: &SelectQuery) -> Option<GroupWindow> {
        match query.limit() {
            Some(limit) if self.parent_keys.len() > 1 => Some(GroupWindow {
                offset: u64::from(query.offset().unwrap_or(0)),
                limit: u64::from(limit),
            }),
            _ => None,
        }
    }

    //
    // Reads
    //

    /// Partition of every sibling group, executing the batched query once
    /// per (ancestor path, signature).
    pub fn execute(&mut self) -> Result<Rc<ReferencingEntry>, InternalError> {
        if let Some(entry) = &self.data {
            return Ok(Rc::clone(entry));
        }

        let mut query = self.batched_query();
        let key = CacheKey {
            path: self.node.ancestor_path(),
            signature: query.signature(),
        };

        let cached = self.cache.borrow().referencing(&key);
        self.session.record(MetricsEvent::CacheLookup {
            cache: CacheKind::Referencing,
            table: self.table(),
            hit: cached.is_some(),
        });

        let entry = match cached {
            Some(entry) => entry,
            None => {
                let window = self.window(&query);
                if window.is_some() {
                    query.set_limit(None, None);
                }

                let rows = self.session.select(&query)?;
                let entry = ReferencingEntry::partition(rows, &self.column, window)?;

                debug!(
                    table = self.table(),
                    path = %key.path,
                    signature = %key.signature,
                    groups = entry.group_count(),
                    rows = entry.rows().len(),
                    dropped = entry.dropped(),
                    "batched grouped selection"
                );
                self.session.record(MetricsEvent::Partition {
                    table: self.table(),
                    retained: entry.rows().len() as u64,
                    dropped: entry.dropped(),
                });

                self.cache.borrow_mut().insert_referencing(key, entry)
            }
        };

        self.data = Some(Rc::clone(&entry));

        Ok(entry)
    }

    /// Raw rows of the active group, in query order.
    pub fn rows(&mut self) -> Result<Vec<Row>, InternalError> {
        let active = self.active_key()?.clone();
        let entry = self.execute()?;

        Ok(entry.group(&active).cloned().collect())
    }

    /// Rows of the active group materialized as entities.
    pub fn fetch(&mut self) -> Result<Vec<Box<dyn Entity>>, InternalError> {
        self.rows()?
            .into_iter()
            .map(|row| self.instantiate(row))
            .collect()
    }

    /// Number of rows in the active group's bucket.
    pub fn group_len(&mut self) -> Result<usize, InternalError> {
        let active = self.active_key()?.clone();
        Ok(self.execute()?.group_len(&active))
    }

    pub fn instantiate(&self, row: Row) -> Result<Box<dyn Entity>, InternalError> {
        self.session
            .instantiate(row, self.table(), self.row_kind.as_deref())
    }

    //
    // Aggregation
    //

    /// Aggregate of the active group, computed for every sibling group in
    /// one `GROUP BY` query. A count over a group without rows is 0.
    pub fn aggregation(&self, function: &str) -> Result<Option<Value>, InternalError> {
        let expr = AggregateExpr::parse(function)?;
        self.aggregate(expr)
    }

    /// Row count of the active group; 0 when the group has no rows.
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

    pub fn sum(&self, column: &str) -> Result<Option<Value>, InternalError> {
        self.aggregate(AggregateExpr::of(AggregateFunction::Sum, column))
    }

    pub fn min(&self, column: &str) -> Result<Option<Value>, InternalError> {
        self.aggregate(AggregateExpr::of(AggregateFunction::Min, column))
    }

    pub fn max(&self, column: &str) -> Result<Option<Value>, InternalError> {
        self.aggregate(AggregateExpr::of(AggregateFunction::Max, column))
    }

    fn aggregate(&self, expr: AggregateExpr) -> Result<Option<Value>, InternalError> {
        let active = self.active_key()?;
        let counting = expr.function == AggregateFunction::Count;
        let query = self.batched_query();
        let key = AggregationKey {
            path: self.node.ancestor_path(),
            function: expr.to_string(),
            signature: query.signature(),
        };

        let cached = self.cache.borrow().aggregation(&key);
        self.session.record(MetricsEvent::CacheLookup {
            cache: CacheKind::Aggregation,
            table: self.table(),
            hit: cached.is_some(),
        });

        let entry = match cached {
            Some(entry) => entry,
            None => {
                let column = self.grouping_column();
                let mut grouped = SelectQuery::new(self.table());
                grouped.import_conditions(&query);
                grouped.push_select(SelectItem::Aggregate(expr));
                grouped.push_select(SelectItem::Column(column.clone()));
                grouped.group(column);

                let rows = self.session.select(&grouped)?;
                let entry = AggregationEntry::collect(rows, &self.column)?;

                debug!(
                    table = self.table(),
                    path = %key.path,
                    function = %key.function,
                    groups = entry.len(),
                    "grouped aggregation"
                );

                self.cache.borrow_mut().insert_aggregation(key, entry)
            }
        };

        let value = entry.value(active).cloned();

        Ok(value.or_else(|| counting.then_some(Value::Int(0))))
    }

    //
    // Writes
    //

    /// Insert rows into the active group; the group key is stamped on each.
    pub fn insert(&self, data: impl Into<InsertData>) -> Result<InsertOutcome, InternalError> {
        let active = self.active_key()?;

        let mut data = data.into();
        data.stamp(&self.column, active);

        self.session.insert(self.table(), &data.into_rows())
    }

    /// Update every row of the active group. The selection's own filters
    /// do not apply.
    pub fn update(&self, values: &Row) -> Result<u64, InternalError> {
        let active = self.active_key()?;

        let mut scoped = SelectQuery::new(self.table());
        scoped.where_eq(self.grouping_column(), active.clone());

        self.session.update(&scoped, values)
    }

    /// Delete the rows of the active group that match this selection's
    /// filters.
    pub fn delete(&self) -> Result<u64, InternalError> {
        let active = self.active_key()?;

        let mut scoped = SelectQuery::new(self.table());
        scoped.import_conditions(&self.query);
        scoped.prepend_condition(Condition::eq(self.grouping_column(), active.clone()));

        self.session.delete(&scoped)
    }

    //
    // Relations
    //

    /// Grouped child of this selection, driven by the primary keys of every
    /// sibling group's rows.
    pub fn related(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Result<Self, InternalError> {
        let primary = self.session.primary_key(self.table())?;
        let entry = self.execute()?;
        let keys = distinct_keys(entry.rows(), &primary);

        Ok(Self::new(
            self.session.clone(),
            Rc::clone(&self.node),
            table.into(),
            column.into(),
            keys,
            Rc::clone(&self.cache),
        ))
    }
}

/// Distinct non-null values of `column`, in first-seen order.
pub(crate) fn distinct_keys(rows: &[Row], column: &str) -> Vec<Value> {
    let mut seen = HashSet::new();

    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null())
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}
