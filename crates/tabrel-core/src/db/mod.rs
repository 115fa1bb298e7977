pub mod cache;
pub mod entity;
pub mod executor;
pub mod grouped;
pub mod manager;
pub mod memory;
pub mod query;
pub mod selection;

mod row;
mod session;

// re-exports
pub use grouped::GroupedSelection;
pub use manager::{DeleteTarget, Manager, ManagerError};
pub use row::Row;
pub use selection::{InsertData, RelationNode, Selection};
pub use session::{Session, SessionBuilder};
