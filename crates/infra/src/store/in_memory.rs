use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use barista_catalog::{Drink, DrinkPatch, NewDrink};
use barista_core::DrinkId;

use super::{DrinkStore, StoreError};

#[derive(Debug, Default)]
struct Catalog {
    last_id: i64,
    drinks: BTreeMap<DrinkId, Drink>,
}

impl Catalog {
    fn title_taken(&self, title: &str, except: Option<DrinkId>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

/// In-memory drink store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDrinkStore {
    inner: RwLock<Catalog>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".to_string()))
    }
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        Ok(self.read()?.drinks.values().cloned().collect())
    }

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        self.read()?.drinks.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, draft: NewDrink) -> Result<Drink, StoreError> {
        draft.validate()?;
        let mut catalog = self.write()?;
        let title = draft.title.trim();
        if catalog.title_taken(title, None) {
            return Err(StoreError::Duplicate(title.to_string()));
        }

        catalog.last_id += 1;
        let drink = Drink::from_new(DrinkId::new(catalog.last_id), draft);
        catalog.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut catalog = self.write()?;
        let mut drink = catalog.drinks.get(&id).cloned().ok_or(StoreError::NotFound)?;
        patch.apply_to(&mut drink)?;
        if catalog.title_taken(&drink.title, Some(id)) {
            return Err(StoreError::Duplicate(drink.title));
        }

        catalog.drinks.insert(id, drink.clone());
        Ok(drink)
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        self.write()?
            .drinks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut catalog = self.write()?;
        catalog.drinks.clear();
        catalog.last_id = 0;
        Ok(())
    }
}
