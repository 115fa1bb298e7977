use derive_more::Display;
use serde::{Deserialize, Serialize};
use tabrel_config::ConfigError;
use tabrel_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::NotFound => ErrorKind::NotFound,
            ErrorClass::Conflict => ErrorKind::Conflict,
            ErrorClass::Unsupported => ErrorKind::Unsupported,
            ErrorClass::InvariantViolation => ErrorKind::Invalid,
            ErrorClass::Config => ErrorKind::Config,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A referenced table or row does not exist.
    NotFound,

    /// The write collides with existing state.
    Conflict,

    /// The request is malformed or misses required data.
    Invalid,

    /// Valid request for something the collaborator cannot do.
    Unsupported,

    /// Settings or entity registration are wrong.
    Config,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Cache,
    Config,
    Entity,
    Executor,
    Manager,
    Query,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Cache => Self::Cache,
            CoreErrorOrigin::Entity => Self::Entity,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Manager => Self::Manager,
            CoreErrorOrigin::Query => Self::Query,
        }
    }
}

///
/// TESTS
///
