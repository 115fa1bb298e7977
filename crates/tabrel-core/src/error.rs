use crate::db::{entity::EntityRegistryError, manager::ManagerError, query::QueryParseError};
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without a structured detail payload.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a query-origin invariant violation.
    pub(crate) fn query_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Query, message)
    }

    /// Construct a cache-origin invariant violation.
    pub(crate) fn cache_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Cache, message)
    }

    /// Construct an executor-origin unsupported error.
    pub fn executor_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Executor, message)
    }

    /// Construct an executor-origin conflict error.
    pub fn executor_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Executor, message)
    }

    /// Construct an executor-origin not-found error for an unknown table.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        let table = table.into();

        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Executor,
            format!("unknown table: '{table}'"),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Manager(ManagerError),

    #[error("{0}")]
    Registry(EntityRegistryError),

    #[error("{0}")]
    QueryParse(QueryParseError),
}

impl From<ManagerError> for InternalError {
    fn from(err: ManagerError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Manager,
            message: err.to_string(),
            detail: Some(ErrorDetail::Manager(err)),
        }
    }
}

impl From<EntityRegistryError> for InternalError {
    fn from(err: EntityRegistryError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Entity,
            message: err.to_string(),
            detail: Some(ErrorDetail::Registry(err)),
        }
    }
}

impl From<QueryParseError> for InternalError {
    fn from(err: QueryParseError) -> Self {
        Self {
            class: ErrorClass::Unsupported,
            origin: ErrorOrigin::Query,
            message: err.to_string(),
            detail: Some(ErrorDetail::QueryParse(err)),
        }
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    Unsupported,
    InvariantViolation,
    Config,
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Query,
    Cache,
    Entity,
    Manager,
    Executor,
}
