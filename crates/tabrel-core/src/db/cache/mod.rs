//! Module: db::cache
//! Responsibility: keyed stores for batched grouped results and per-group
//! aggregates, and the partition step that splits a batched result by group
//! key.
//! Does not own: query execution or the decision of when to batch.
//!
//! Entries are created once per key and never mutated afterwards. There is
//! no eviction; an entry lives as long as the root selection owning the
//! store.


use crate::{
    db::{Row, query::QuerySignature},
    error::InternalError,
    value::Value,
};
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

///
/// AncestorPath
///
/// Relation names from a grouped selection up to its root, each followed by
/// `.`. Disambiguates nested group-of-group relations that would otherwise
/// share a query signature.
///

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AncestorPath(String);

impl AncestorPath {
    /// Build from relation names ordered innermost first.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut path = String::new();
        for name in names {
            path.push_str(name);
            path.push('.');
        }

        Self(path)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AncestorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// CacheKey
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub path: AncestorPath,
    pub signature: QuerySignature,
}

///
/// AggregationKey
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AggregationKey {
    pub path: AncestorPath,
    pub function: String,
    pub signature: QuerySignature,
}

///
/// GroupWindow
///
/// Per-group offset/limit re-applied while partitioning an unlimited batch.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GroupWindow {
    pub offset: u64,
    pub limit: u64,
}

impl GroupWindow {
    const fn admits(self, position: u64) -> bool {
        position >= self.offset && position - self.offset < self.limit
    }
}

///
/// ReferencingEntry
///
/// One batched grouped result: the visible rows in original order, each
/// group's row indices into them, and how many rows each group consumed
/// (retained or dropped) while partitioning.
///

#[derive(Debug, Default)]
pub struct ReferencingEntry {
    rows: Vec<Row>,
    groups: HashMap<Value, Vec<usize>>,
    consumed: HashMap<Value, u64>,
}

impl ReferencingEntry {
    /// Partition `rows` by the value of `column`.
    ///
    /// Without a window every row is retained. With one, a row is retained
    /// only while its group's running position lies inside the window;
    /// dropped rows still advance that position.
    pub fn partition(
        rows: Vec<Row>,
        column: &str,
        window: Option<GroupWindow>,
    ) -> Result<Self, InternalError> {
        let mut entry = Self::default();

        for row in rows {
            let key = row.get(column).cloned().ok_or_else(|| {
                InternalError::cache_invariant(format!(
                    "grouping column '{column}' missing from batched row"
                ))
            })?;

            let position = entry.consumed.entry(key.clone()).or_insert(0);
            let retain = window.is_none_or(|window| window.admits(*position));
            *position += 1;

            if retain {
                entry.groups.entry(key).or_default().push(entry.rows.len());
                entry.rows.push(row);
            }
        }

        Ok(entry)
    }

    /// Visible rows of every group, in original order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows of one group in original order; empty for an unknown key.
    pub fn group(&self, key: &Value) -> impl Iterator<Item = &Row> {
        self.groups
            .get(key)
            .into_iter()
            .flatten()
            .map(|&index| &self.rows[index])
    }

    #[must_use]
    pub fn group_len(&self, key: &Value) -> usize {
        self.groups.get(key).map_or(0, Vec::len)
    }

    /// Rows the batch produced for `key` before the window was applied.
    #[must_use]
    pub fn consumed(&self, key: &Value) -> u64 {
        self.consumed.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Rows dropped by the window across all groups.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        let total: u64 = self.consumed.values().sum();
        total - self.rows.len() as u64
    }
}

///
/// AggregationEntry
///
/// Group key → the aggregate row produced for that group.
///

#[derive(Debug, Default)]
pub struct AggregationEntry {
    groups: HashMap<Value, Row>,
}

impl AggregationEntry {
    pub fn collect(rows: Vec<Row>, column: &str) -> Result<Self, InternalError> {
        let mut groups = HashMap::with_capacity(rows.len());

        for row in rows {
            let key = row.get(column).cloned().ok_or_else(|| {
                InternalError::cache_invariant(format!(
                    "grouping column '{column}' missing from aggregate row"
                ))
            })?;
            groups.insert(key, row);
        }

        Ok(Self { groups })
    }

    /// The aggregate value (first column) of one group.
    #[must_use]
    pub fn value(&self, key: &Value) -> Option<&Value> {
        self.groups.get(key).and_then(Row::first_value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

///
/// RelationCache
///
/// Referencing and aggregation entries shared by a root selection and all
/// of its grouped descendants.
///

#[derive(Debug, Default)]
pub struct RelationCache {
    referencing: HashMap<CacheKey, Rc<ReferencingEntry>>,
    aggregation: HashMap<AggregationKey, Rc<AggregationEntry>>,
}

impl RelationCache {
    #[must_use]
    pub fn referencing(&self, key: &CacheKey) -> Option<Rc<ReferencingEntry>> {
        self.referencing.get(key).cloned()
    }

    /// Store an entry; an existing entry for the same key wins.
    pub fn insert_referencing(
        &mut self,
        key: CacheKey,
        entry: ReferencingEntry,
    ) -> Rc<ReferencingEntry> {
        Rc::clone(self.referencing.entry(key).or_insert_with(|| Rc::new(entry)))
    }

    #[must_use]
    pub fn aggregation(&self, key: &AggregationKey) -> Option<Rc<AggregationEntry>> {
        self.aggregation.get(key).cloned()
    }

    pub fn insert_aggregation(
        &mut self,
        key: AggregationKey,
        entry: AggregationEntry,
    ) -> Rc<AggregationEntry> {
        Rc::clone(self.aggregation.entry(key).or_insert_with(|| Rc::new(entry)))
    }

    #[must_use]
    pub fn referencing_len(&self) -> usize {
        self.referencing.len()
    }

    #[must_use]
    pub fn aggregation_len(&self) -> usize {
        self.aggregation.len()
    }
}

/// Store shared by one selection hierarchy.
pub type SharedRelationCache = Rc<RefCell<RelationCache>>;
