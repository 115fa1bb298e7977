//! Core runtime for tabrel: values and rows, the select-query model, root and
//! grouped selections, the relation cache, entities, and per-table managers.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, caches, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            GroupedSelection, Manager, Row, Selection, Session,
            entity::{Entity, EntityRow},
        },
        value::Value,
    };
}

/// Build a [`Row`](db::Row) from `column => value` pairs.
#[macro_export]
macro_rules! row {
    () => {
        $crate::db::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::db::Row::new()$(.with($column, $value))+
    };
}
