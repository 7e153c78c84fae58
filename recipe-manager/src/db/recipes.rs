//! Recipe storage
//!
//! Stored column formats:
//! - `dough`: `{"flour": 55.7, "water": 41.6, ..., "percentVariation": -10}`
//! - `topping`: `{"peeledTomatoes": 300, ..., "referenceArea": 1200}`
//! - `steps`: `["Mix", "Proof", "Bake"]`
//!
//! Loaded ingredients are ordered by amount (descending), then name.

use async_trait::async_trait;
use recipe_common::{Dough, Error, Ingredient, Recipe, Result, Topping};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use std::cmp::Ordering;
use tracing::{debug, info};
use uuid::Uuid;

use crate::service::RecipeRepository;

const PERCENT_VARIATION_KEY: &str = "percentVariation";
const REFERENCE_AREA_KEY: &str = "referenceArea";

/// SQLite-backed [`RecipeRepository`]
#[derive(Debug, Clone)]
pub struct SqliteRecipeRepository {
    pool: SqlitePool,
}

impl SqliteRecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeRepository for SqliteRecipeRepository {
    async fn get_recipe_by_uuid(&self, uuid: Uuid) -> Result<Recipe> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, author, dough, topping, steps
            FROM recipes
            WHERE uuid = ?
            "#,
        )
        .bind(uuid.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::RecipeNotFound(uuid))?;

        let dough: String = row.try_get("dough")?;
        let topping: Option<String> = row.try_get("topping")?;
        let steps: Option<String> = row.try_get("steps")?;

        let recipe = Recipe {
            id: row.try_get("id")?,
            uuid,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            author: row.try_get("author")?,
            dough: parse_dough(&dough)?,
            topping: topping.as_deref().map(parse_topping).transpose()?,
            steps: match steps {
                Some(steps) => serde_json::from_str(&steps)?,
                None => Vec::new(),
            },
        };

        debug!(recipe = %uuid, id = recipe.id, "Loaded recipe");
        Ok(recipe)
    }
}

/// Store a recipe, returning its new row id
///
/// `recipe.id` is ignored; the database assigns one.
pub async fn insert_recipe(pool: &SqlitePool, recipe: &Recipe) -> Result<i64> {
    let steps = if recipe.steps.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&recipe.steps)?)
    };

    let result = sqlx::query(
        r#"
        INSERT INTO recipes (uuid, name, description, author, dough, topping, steps, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(recipe.uuid.to_string())
    .bind(&recipe.name)
    .bind(&recipe.description)
    .bind(&recipe.author)
    .bind(dough_to_json(&recipe.dough))
    .bind(recipe.topping.as_ref().map(topping_to_json))
    .bind(steps)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert [`demo_recipe`] when the table is empty
///
/// Returns the demo recipe's UUID when it was inserted.
pub async fn seed_demo(pool: &SqlitePool) -> Result<Option<Uuid>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        info!("Recipes table holds {} recipes, demo data not seeded", count);
        return Ok(None);
    }

    let recipe = demo_recipe();
    insert_recipe(pool, &recipe).await?;
    info!("Seeded demo recipe '{}' ({})", recipe.name, recipe.uuid);
    Ok(Some(recipe.uuid))
}

/// Pan pizza with tomato and mozzarella topping
pub fn demo_recipe() -> Recipe {
    Recipe {
        id: 0,
        uuid: Uuid::new_v4(),
        name: "Pizza in teglia".to_string(),
        description: "Roman-style pan pizza with tomato and mozzarella".to_string(),
        author: "Recipe Manager".to_string(),
        dough: Dough {
            name: String::new(),
            percent_variation: -10.0,
            ingredients: vec![
                Ingredient::new("flour", 55.7),
                Ingredient::new("water", 41.6),
                Ingredient::new("salt", 1.1),
                Ingredient::new("evoOil", 1.1),
                Ingredient::new("yeast", 0.5),
            ],
        },
        topping: Some(Topping {
            name: String::new(),
            reference_area: 1200.0,
            ingredients: vec![
                Ingredient::new("peeledTomatoes", 300.0),
                Ingredient::new("mozzarellaCheese", 250.0),
                Ingredient::new("parmesanCheese", 20.0),
                Ingredient::new("basil", 15.0),
                Ingredient::new("evoOil", 15.0),
            ],
        }),
        steps: vec![
            "Mix flour, water and yeast; add salt and oil last".to_string(),
            "Rest 24 hours in the fridge".to_string(),
            "Stretch into oiled pans and proof 2 hours".to_string(),
            "Top and bake at 250 °C for 15 minutes".to_string(),
        ],
    }
}

// ========================================
// Column codecs
// ========================================

fn parse_dough(json: &str) -> Result<Dough> {
    let mut map: Map<String, Value> = serde_json::from_str(json)?;
    let percent_variation = take_number(&mut map, PERCENT_VARIATION_KEY, "dough")?.unwrap_or(0.0);

    Ok(Dough {
        name: String::new(),
        percent_variation,
        ingredients: parse_ingredients(map, "dough")?,
    })
}

fn parse_topping(json: &str) -> Result<Topping> {
    let mut map: Map<String, Value> = serde_json::from_str(json)?;
    let reference_area = take_number(&mut map, REFERENCE_AREA_KEY, "topping")?.ok_or_else(|| {
        Error::InvalidBaseRecipe(format!("topping has no {}", REFERENCE_AREA_KEY))
    })?;

    Ok(Topping {
        name: String::new(),
        reference_area,
        ingredients: parse_ingredients(map, "topping")?,
    })
}

fn take_number(map: &mut Map<String, Value>, key: &str, part: &str) -> Result<Option<f64>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            Error::InvalidBaseRecipe(format!("{} {} is not a number: {}", part, key, value))
        }),
    }
}

fn parse_ingredients(map: Map<String, Value>, part: &str) -> Result<Vec<Ingredient>> {
    let mut ingredients = map
        .into_iter()
        .map(|(name, value)| match value.as_f64() {
            Some(amount) => Ok(Ingredient { name, amount }),
            None => Err(Error::InvalidBaseRecipe(format!(
                "{} ingredient {} is not a number: {}",
                part, name, value
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    ingredients.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(ingredients)
}

fn dough_to_json(dough: &Dough) -> String {
    let mut map = ingredients_to_map(&dough.ingredients);
    map.insert(
        PERCENT_VARIATION_KEY.to_string(),
        Value::from(dough.percent_variation),
    );
    Value::Object(map).to_string()
}

fn topping_to_json(topping: &Topping) -> String {
    let mut map = ingredients_to_map(&topping.ingredients);
    map.insert(
        REFERENCE_AREA_KEY.to_string(),
        Value::from(topping.reference_area),
    );
    Value::Object(map).to_string()
}

fn ingredients_to_map(ingredients: &[Ingredient]) -> Map<String, Value> {
    ingredients
        .iter()
        .map(|i| (i.name.clone(), Value::from(i.amount)))
        .collect()
}
