use crate::{
    db::entity::{Entity, EntityRow, GenericEntity},
    error::ErrorClass,
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Kind name of [`GenericEntity`], always registered.
pub const DEFAULT_ENTITY_KIND: &str = "entity";

///
/// EntityFactory
///

pub type EntityFactory = fn(EntityRow) -> Box<dyn Entity>;

fn hydrate<T: Entity>(row: EntityRow) -> Box<dyn Entity> {
    Box::new(T::from_row(row))
}

///
/// EntityRegistryError
///

#[derive(Debug, ThisError)]
pub enum EntityRegistryError {
    #[error("entity kind '{0}' is not registered")]
    UnknownKind(String),

    #[error("entity kind '{0}' already registered")]
    KindAlreadyRegistered(String),
}

impl EntityRegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownKind(_) => ErrorClass::Config,
            Self::KindAlreadyRegistered(_) => ErrorClass::InvariantViolation,
        }
    }
}

///
/// EntityRegistry
///
/// Kind name → factory. Settings map tables to kind names; the registry maps
/// kind names to code.
///

#[derive(Clone, Debug)]
pub struct EntityRegistry {
    kinds: HashMap<String, EntityFactory>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    /// Create a registry holding only the default kind.
    #[must_use]
    pub fn new() -> Self {
        let mut kinds = HashMap::new();
        kinds.insert(
            DEFAULT_ENTITY_KIND.to_string(),
            hydrate::<GenericEntity> as EntityFactory,
        );

        Self { kinds }
    }

    /// Register `T` under `kind`.
    pub fn register<T: Entity>(&mut self, kind: impl Into<String>) -> Result<(), EntityRegistryError> {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            return Err(EntityRegistryError::KindAlreadyRegistered(kind));
        }

        self.kinds.insert(kind, hydrate::<T>);

        Ok(())
    }

    /// Builder-style registration.
    pub fn with<T: Entity>(mut self, kind: impl Into<String>) -> Result<Self, EntityRegistryError> {
        self.register::<T>(kind)?;
        Ok(self)
    }

    pub fn factory(&self, kind: &str) -> Result<EntityFactory, EntityRegistryError> {
        self.kinds
            .get(kind)
            .copied()
            .ok_or_else(|| EntityRegistryError::UnknownKind(kind.to_string()))
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }
}
