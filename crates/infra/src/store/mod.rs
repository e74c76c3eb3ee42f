//! Drink storage abstraction.
//!
//! Every operation either fully succeeds or leaves the store unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use barista_catalog::{Drink, DrinkPatch, NewDrink, seed_drinks};
use barista_core::{DomainError, DrinkId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDrinkStore;
pub use postgres::PgDrinkStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("drink not found")]
    NotFound,

    #[error("a drink titled '{0}' already exists")]
    Duplicate(String),

    #[error("invalid drink: {0}")]
    Invalid(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Invalid(msg),
        }
    }
}

#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks ordered by id.
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;
    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError>;
    async fn insert(&self, draft: NewDrink) -> Result<Drink, StoreError>;
    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError>;
    async fn delete(&self, id: DrinkId) -> Result<(), StoreError>;
    /// Remove every drink.
    async fn reset(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DrinkStore for Arc<S>
where
    S: DrinkStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        (**self).get(id).await
    }

    async fn insert(&self, draft: NewDrink) -> Result<Drink, StoreError> {
        (**self).insert(draft).await
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        (**self).reset().await
    }
}

/// Wipe the catalog and insert the seed drinks.
pub async fn reset_and_seed(store: &dyn DrinkStore) -> Result<Vec<Drink>, StoreError> {
    store.reset().await?;
    let mut seeded = Vec::new();
    for draft in seed_drinks() {
        seeded.push(store.insert(draft).await?);
    }
    tracing::info!(drinks = seeded.len(), "catalog reset and seeded");
    Ok(seeded)
}
