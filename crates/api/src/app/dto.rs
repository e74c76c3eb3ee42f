//! Request/response DTOs and JSON mapping helpers.

use serde::{Deserialize, Serialize};

use barista_catalog::{Drink, DrinkPatch, DrinkSummary, NewDrink, Recipe};
use barista_core::DrinkId;

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl CreateDrinkRequest {
    /// Both fields are required to create a drink.
    pub fn into_draft(self) -> Option<NewDrink> {
        Some(NewDrink::new(self.title?, self.recipe?))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl From<UpdateDrinkRequest> for DrinkPatch {
    fn from(value: UpdateDrinkRequest) -> Self {
        DrinkPatch {
            title: value.title,
            recipe: value.recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl DrinksResponse<DrinkSummary> {
    pub fn short(drinks: &[Drink]) -> Self {
        Self {
            success: true,
            drinks: drinks.iter().map(Drink::summary).collect(),
        }
    }
}

impl DrinksResponse<Drink> {
    pub fn long(drinks: Vec<Drink>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: DrinkId,
}
