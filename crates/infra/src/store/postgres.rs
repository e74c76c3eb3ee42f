//! Postgres-backed drink store.
//!
//! Recipes are stored as JSONB. The `drinks` table is created on connect if
//! it does not exist; there is no migration history.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use barista_catalog::{Drink, DrinkPatch, Ingredient, NewDrink, Recipe};
use barista_core::DrinkId;

use super::{DrinkStore, StoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS drinks (
    id     BIGSERIAL PRIMARY KEY,
    title  TEXT NOT NULL UNIQUE,
    recipe JSONB NOT NULL
)
"#;

/// Postgres drink store.
///
/// Uses the SQLx connection pool (thread-safe). Uniqueness of titles is
/// enforced by the table constraint, not by a read-then-write check.
#[derive(Debug, Clone)]
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    /// Connect and make sure the `drinks` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(backend)?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(drink_from_row).collect()
    }

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound)?;
        drink_from_row(&row)
    }

    async fn insert(&self, draft: NewDrink) -> Result<Drink, StoreError> {
        draft.validate()?;
        let title = draft.title.trim().to_string();
        let recipe: Vec<Ingredient> = draft.recipe.into();

        let row = sqlx::query(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&title)
        .bind(Json(&recipe))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &title))?;
        drink_from_row(&row)
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound)?;
        let mut drink = drink_from_row(&row)?;
        patch.apply_to(&mut drink)?;

        sqlx::query("UPDATE drinks SET title = $2, recipe = $3 WHERE id = $1")
            .bind(id.get())
            .bind(&drink.title)
            .bind(Json(drink.recipe.ingredients()))
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &drink.title))?;

        tx.commit().await.map_err(backend)?;
        Ok(drink)
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("TRUNCATE drinks RESTART IDENTITY")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn drink_from_row(row: &PgRow) -> Result<Drink, StoreError> {
    let id: i64 = row.try_get("id").map_err(backend)?;
    let title: String = row.try_get("title").map_err(backend)?;
    let Json(recipe): Json<Vec<Ingredient>> = row.try_get("recipe").map_err(backend)?;
    Ok(Drink {
        id: DrinkId::new(id),
        title,
        recipe: Recipe::from(recipe),
    })
}

fn write_error(err: sqlx::Error, title: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(title.to_string())
        }
        _ => backend(err),
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "drink store query failed");
    StoreError::Backend(err.to_string())
}
