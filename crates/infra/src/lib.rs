//! Infrastructure layer: drink storage adapters.

pub mod store;

pub use store::{DrinkStore, InMemoryDrinkStore, PgDrinkStore, StoreError, reset_and_seed};
