//! Module: db::entity
//! Responsibility: typed wrappers around raw rows and the registry that
//! decides which wrapper a table's rows are materialized as.
//! Does not own: persistence; entities never write themselves back.

mod registry;


use crate::{db::Row, value::Value};
use std::{any::Any, fmt};

// re-exports
pub use registry::{DEFAULT_ENTITY_KIND, EntityFactory, EntityRegistry, EntityRegistryError};

///
/// EntityRow
///
/// Raw row plus the table it came from and that table's primary-key column.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityRow {
    table: String,
    primary: String,
    row: Row,
}

impl EntityRow {
    #[must_use]
    pub fn new(table: impl Into<String>, primary: impl Into<String>, row: Row) -> Self {
        Self {
            table: table.into(),
            primary: primary.into(),
            row,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_column(&self) -> &str {
        &self.primary
    }

    #[must_use]
    pub fn primary_value(&self) -> Option<&Value> {
        self.row.get(&self.primary)
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.row.get(column)
    }

    #[must_use]
    pub const fn row(&self) -> &Row {
        &self.row
    }

    #[must_use]
    pub fn into_row(self) -> Row {
        self.row
    }
}

///
/// Entity
///
/// Typed view over one row. Implementors are registered under a kind name
/// and picked at runtime, so the trait stays object safe apart from
/// `from_row`.
///

pub trait Entity: fmt::Debug + 'static {
    fn from_row(row: EntityRow) -> Self
    where
        Self: Sized;

    fn entity_row(&self) -> &EntityRow;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Entity {
    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Entity>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.entity_row().table()
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entity_row().get(column)
    }

    #[must_use]
    pub fn primary_value(&self) -> Option<&Value> {
        self.entity_row().primary_value()
    }

    #[must_use]
    pub fn row(&self) -> &Row {
        self.entity_row().row()
    }
}

///
/// GenericEntity
///
/// Default kind: exposes the row as-is.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenericEntity {
    inner: EntityRow,
}

impl Entity for GenericEntity {
    fn from_row(row: EntityRow) -> Self {
        Self { inner: row }
    }

    fn entity_row(&self) -> &EntityRow {
        &self.inner
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
