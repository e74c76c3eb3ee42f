use serde::{Deserialize, Serialize};

use barista_core::{DomainError, DomainResult, DrinkId};

/// One line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, color: impl Into<String>, parts: u32) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            parts,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("ingredient name must not be empty"));
        }
        if self.color.trim().is_empty() {
            return Err(DomainError::validation("ingredient color must not be empty"));
        }
        if self.parts == 0 {
            return Err(DomainError::validation("ingredient parts must be positive"));
        }
        Ok(())
    }
}

/// Public projection of an ingredient (no name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientSummary {
    pub color: String,
    pub parts: u32,
}

/// Ordered list of ingredients.
///
/// Clients may send a single ingredient object instead of an array, or either
/// shape as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RecipeRepr", into = "Vec<Ingredient>")]
pub struct Recipe(Vec<Ingredient>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeShape {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeRepr {
    Shape(RecipeShape),
    Encoded(String),
}

impl TryFrom<RecipeRepr> for Recipe {
    type Error = String;

    fn try_from(value: RecipeRepr) -> Result<Self, Self::Error> {
        let shape = match value {
            RecipeRepr::Shape(shape) => shape,
            RecipeRepr::Encoded(raw) => serde_json::from_str(&raw)
                .map_err(|e| format!("recipe string is not a recipe: {e}"))?,
        };
        Ok(match shape {
            RecipeShape::Many(items) => Self(items),
            RecipeShape::One(item) => Self(vec![item]),
        })
    }
}

impl From<Recipe> for Vec<Ingredient> {
    fn from(value: Recipe) -> Self {
        value.0
    }
}

impl From<Vec<Ingredient>> for Recipe {
    fn from(value: Vec<Ingredient>) -> Self {
        Self(value)
    }
}

impl Recipe {
    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> DomainResult<()> {
        if self.0.is_empty() {
            return Err(DomainError::validation("recipe must contain at least one ingredient"));
        }
        self.0.iter().try_for_each(Ingredient::validate)
    }
}

/// A drink in the catalog. Serializes as the detailed ("long") view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Recipe,
}

/// Public ("short") view of a drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkSummary {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

impl Drink {
    /// Materialize a validated draft under a store-assigned id.
    pub fn from_new(id: DrinkId, draft: NewDrink) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            recipe: draft.recipe,
        }
    }

    pub fn summary(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .ingredients()
                .iter()
                .map(|i| IngredientSummary {
                    color: i.color.clone(),
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

/// Drink draft (not yet stored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

impl NewDrink {
    pub fn new(title: impl Into<String>, recipe: impl Into<Recipe>) -> Self {
        Self {
            title: title.into(),
            recipe: recipe.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.title)?;
        self.recipe.validate()
    }
}

/// Partial update: only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl DrinkPatch {
    /// Apply the patch to `drink`, leaving it untouched on validation failure.
    pub fn apply_to(self, drink: &mut Drink) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(recipe) = &self.recipe {
            recipe.validate()?;
        }

        if let Some(title) = self.title {
            drink.title = title.trim().to_string();
        }
        if let Some(recipe) = self.recipe {
            drink.recipe = recipe;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(())
}

/// Catalog contents after a reset.
pub fn seed_drinks() -> Vec<NewDrink> {
    vec![NewDrink::new("water", vec![Ingredient::new("water", "blue", 1)])]
}
