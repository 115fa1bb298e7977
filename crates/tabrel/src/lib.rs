//! ## Crate layout
//! - `core`: values, the select-query model, root and grouped selections,
//!   the relation cache, entities, managers, and observability.
//! - `config`: session settings loaded from TOML.
//! - `error`: the public error type.
//!
//! The `prelude` module mirrors the surface most callers need.

pub use tabrel_config as config;
pub use tabrel_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};
pub use tabrel_core::{db, row};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::core::{
        db::{
            GroupedSelection, Manager, Row, Selection, Session,
            entity::{Entity, EntityRegistry, EntityRow},
            executor::QueryExecutor,
        },
        value::Value,
    };
}
