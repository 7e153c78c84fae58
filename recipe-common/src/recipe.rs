//! Recipe domain model
//!
//! A stored recipe keeps its dough as proportional ratios (summing to roughly 100)
//! and its topping as absolute amounts for a reference area. The balancer turns
//! both into absolute quantities for a concrete set of pans.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One named quantity in a dough or topping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Dough ingredient list plus a percent adjustment of the total weight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dough {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub percent_variation: f64,
    pub ingredients: Vec<Ingredient>,
}

/// Topping ingredient list designed for `reference_area` square centimetres
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topping {
    #[serde(default)]
    pub name: String,
    pub reference_area: f64,
    pub ingredients: Vec<Ingredient>,
}

/// Sum of all ingredient amounts
pub fn total_amount(ingredients: &[Ingredient]) -> f64 {
    ingredients.iter().map(|i| i.amount).sum()
}

impl Dough {
    pub fn total(&self) -> f64 {
        total_amount(&self.ingredients)
    }
}

impl Topping {
    pub fn total(&self) -> f64 {
        total_amount(&self.ingredients)
    }
}

/// Stored recipe, read-only input to the balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub author: String,
    pub dough: Dough,
    #[serde(default)]
    pub topping: Option<Topping>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Per-pan breakdown of a balanced recipe, in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitIngredients {
    pub split_dough: Vec<Dough>,
    pub split_topping: Vec<Topping>,
}

/// Recipe scaled to the requested pans
///
/// `recipe.dough` and `recipe.topping` hold the scaled totals; the split lists
/// hold one entry per pan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAggregate {
    pub recipe: Recipe,
    pub split_ingredients: SplitIngredients,
}
