//! Drink catalog domain: drinks, recipes and their public/detailed views.

pub mod drink;

pub use drink::{
    Drink, DrinkPatch, DrinkSummary, Ingredient, IngredientSummary, NewDrink, Recipe, seed_drinks,
};
