//! Module: db::manager
//! Responsibility: per-table CRUD convenience over selections, returning
//! rows as entities of the table's resolved kind.
//! Does not own: query execution or entity kind registration.

#[cfg(test)]
mod tests;

use crate::{
    db::{Row, Session, entity::Entity, selection::Selection},
    error::{ErrorClass, InternalError},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ManagerError
///

#[derive(Debug, ThisError)]
pub enum ManagerError {
    #[error("manager has no table name")]
    UndefinedTable,

    #[error("missing primary key '{column}' for table '{table}'")]
    MissingPrimaryKey { table: String, column: String },

    #[error("entity of table '{found}' handed to manager of '{expected}'")]
    ForeignEntity { expected: String, found: String },

    #[error("row created in '{table}' could not be read back")]
    CreatedRowMissing { table: String },
}

impl ManagerError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UndefinedTable => ErrorClass::Config,
            Self::MissingPrimaryKey { .. } | Self::ForeignEntity { .. } => {
                ErrorClass::InvariantViolation
            }
            Self::CreatedRowMissing { .. } => ErrorClass::NotFound,
        }
    }
}

///
/// DeleteTarget
///
/// What `Manager::delete` removes: an entity, or a raw primary key.
///

#[derive(Clone, Copy, Debug)]
pub enum DeleteTarget<'a> {
    Entity(&'a dyn Entity),
    Key(&'a Value),
}

impl<'a> From<&'a dyn Entity> for DeleteTarget<'a> {
    fn from(entity: &'a dyn Entity) -> Self {
        Self::Entity(entity)
    }
}

impl<'a> From<&'a Value> for DeleteTarget<'a> {
    fn from(key: &'a Value) -> Self {
        Self::Key(key)
    }
}

///
/// Manager
///
/// CRUD entry point for one table.
///

#[derive(Clone)]
pub struct Manager {
    session: Session,
    table: String,
    primary: String,
}

impl Manager {
    /// Bind a manager to `table`, resolving its primary-key column.
    pub fn new(session: &Session, table: impl Into<String>) -> Result<Self, InternalError> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(ManagerError::UndefinedTable.into());
        }

        let primary = session.primary_key(&table)?;

        Ok(Self {
            session: session.clone(),
            table,
            primary,
        })
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_column(&self) -> &str {
        &self.primary
    }

    /// Fresh selection over the whole table.
    #[must_use]
    pub fn table(&self) -> Selection {
        self.session.table(self.table.as_str())
    }

    /// Wrap a raw row using the owning selection's entity kind.
    pub fn instantiate(
        &self,
        row: Row,
        selection: &Selection,
    ) -> Result<Box<dyn Entity>, InternalError> {
        self.session
            .instantiate(row, selection.table(), selection.row_kind())
    }

    /// Selection filtered by equality on every `(column, value)` pair.
    pub fn get_all<K, V>(&self, conditions: impl IntoIterator<Item = (K, V)>) -> Selection
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut selection = self.table();
        selection.where_all(conditions);
        selection
    }

    pub fn find_all<K, V>(&self, conditions: impl IntoIterator<Item = (K, V)>) -> Selection
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.get_all(conditions)
    }

    /// Entity with primary key `key`; `None` when no such row exists.
    pub fn get(&self, key: impl Into<Value>) -> Result<Option<Box<dyn Entity>>, InternalError> {
        self.table().get(key)
    }

    pub fn find(&self, key: impl Into<Value>) -> Result<Option<Box<dyn Entity>>, InternalError> {
        self.get(key)
    }

    /// Insert `values` and return the row as stored.
    pub fn create(&self, values: Row) -> Result<Box<dyn Entity>, InternalError> {
        let supplied = values
            .get(&self.primary)
            .filter(|key| !key.is_null())
            .cloned();
        let outcome = self.table().insert(values)?;

        let missing = || ManagerError::CreatedRowMissing {
            table: self.table.clone(),
        };
        let key = supplied.or(outcome.last_id).ok_or_else(missing)?;

        self.get(key)?.ok_or_else(|| missing().into())
    }

    /// Unsaved entity of this table's resolved kind.
    pub fn new_entity(&self, values: Row) -> Result<Box<dyn Entity>, InternalError> {
        self.session.instantiate(values, &self.table, None)
    }

    /// Update the row identified by the primary key in `values` with the
    /// remaining columns, then read it back.
    pub fn update(&self, mut values: Row) -> Result<Option<Box<dyn Entity>>, InternalError> {
        let key = match values.remove(&self.primary) {
            Some(key) if !key.is_null() => key,
            _ => {
                return Err(ManagerError::MissingPrimaryKey {
                    table: self.table.clone(),
                    column: self.primary.clone(),
                }
                .into());
            }
        };

        if !values.is_empty() {
            let mut selection = self.table();
            selection.where_eq(self.primary.as_str(), key.clone());
            selection.update(&values)?;
        }

        self.get(key)
    }

    /// Delete one row; true when exactly one row was removed.
    pub fn delete<'a>(&self, target: impl Into<DeleteTarget<'a>>) -> Result<bool, InternalError> {
        let key = match target.into() {
            DeleteTarget::Key(key) => key.clone(),
            DeleteTarget::Entity(entity) => {
                if entity.table() != self.table {
                    return Err(ManagerError::ForeignEntity {
                        expected: self.table.clone(),
                        found: entity.table().to_string(),
                    }
                    .into());
                }

                // Unsaved entities match no row.
                match entity.primary_value() {
                    Some(key) if !key.is_null() => key.clone(),
                    _ => return Ok(false),
                }
            }
        };

        let mut selection = self.table();
        selection.where_eq(self.primary.as_str(), key);

        Ok(selection.delete()? == 1)
    }
}
