//! Ingredient balancing
//!
//! Scales a stored recipe to the total area of the requested pans, then splits
//! the scaled amounts back per pan in proportion to each pan's area.
//!
//! Dough ratios are expressed per `percentage_base` units of dough weight:
//!
//! ```text
//! dough_weight     = total_area × dough_weight_per_area
//! dough_ratio      = dough_weight × (1 + percent_variation / percentage_base) / percentage_base
//! topping_ratio    = total_area / topping.reference_area
//! pan_ratio        = pan.area / total_area
//! ```
//!
//! Every amount is rounded to one decimal exactly once, when it is assigned.
//!
//! `Pans` may arrive from outside (the remote engine's `/balance`), so each pan's
//! area is checked against its geometry and `total_area` against their sum.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pans::Pans;
use crate::recipe::{Dough, Ingredient, Recipe, RecipeAggregate, SplitIngredients, Topping};
use crate::{Error, Result};

/// Largest accepted difference between a supplied area and the recomputed one
const AREA_TOLERANCE: f64 = 1e-6;

/// Scaling constants, fixed per deployment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Grams of dough per square centimetre of pan
    pub dough_weight_per_area: f64,
    /// Unit the dough ratios and percent variation are expressed against
    pub percentage_base: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            dough_weight_per_area: 1.0,
            percentage_base: 100.0,
        }
    }
}

impl BalancerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dough_weight_per_area > 0.0 && self.dough_weight_per_area.is_finite()) {
            return Err(Error::Config(format!(
                "balancer.dough_weight_per_area must be positive, got {}",
                self.dough_weight_per_area
            )));
        }
        if !(self.percentage_base > 0.0 && self.percentage_base.is_finite()) {
            return Err(Error::Config(format!(
                "balancer.percentage_base must be positive, got {}",
                self.percentage_base
            )));
        }
        Ok(())
    }
}

/// Scales recipes to pan sets
#[derive(Debug, Clone, Default)]
pub struct IngredientsBalancer {
    config: BalancerConfig,
}

impl IngredientsBalancer {
    pub fn new(config: BalancerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Scale `recipe` to `pans` and split the result per pan
    ///
    /// Fails with `InvalidTotalWeight` when the total area is not positive and
    /// `InvalidBaseRecipe` when the recipe cannot be scaled. Nothing is built
    /// before both checks pass.
    pub fn balance(&self, recipe: &Recipe, pans: &Pans) -> Result<RecipeAggregate> {
        let total_area = pans.total_area;
        if !(total_area > 0.0 && total_area.is_finite()) {
            return Err(Error::InvalidTotalWeight { total: total_area });
        }
        validate_pans(pans)?;
        self.validate_recipe(recipe)?;

        let dough_ratio = self.dough_conversion_ratio(total_area, recipe.dough.percent_variation);
        let dough = Dough {
            name: recipe.dough.name.clone(),
            percent_variation: recipe.dough.percent_variation,
            ingredients: scale_ingredients(&recipe.dough.ingredients, dough_ratio),
        };

        let topping = recipe.topping.as_ref().map(|topping| Topping {
            name: topping.name.clone(),
            reference_area: total_area,
            ingredients: scale_ingredients(
                &topping.ingredients,
                total_area / topping.reference_area,
            ),
        });

        let split_dough = pans
            .pans
            .iter()
            .map(|pan| Dough {
                name: pan.name.clone(),
                percent_variation: dough.percent_variation,
                ingredients: scale_ingredients(&dough.ingredients, pan.area / total_area),
            })
            .collect();

        let split_topping = match &topping {
            Some(topping) => pans
                .pans
                .iter()
                .map(|pan| Topping {
                    name: pan.name.clone(),
                    reference_area: pan.area,
                    ingredients: scale_ingredients(&topping.ingredients, pan.area / total_area),
                })
                .collect(),
            None => Vec::new(),
        };

        debug!(
            recipe = %recipe.uuid,
            total_area,
            dough_ratio,
            dough_total = dough.total(),
            pan_count = pans.pans.len(),
            "Balanced recipe"
        );

        Ok(RecipeAggregate {
            recipe: Recipe {
                dough,
                topping,
                ..recipe.clone()
            },
            split_ingredients: SplitIngredients {
                split_dough,
                split_topping,
            },
        })
    }

    /// Multiplier turning dough ratios into grams for `total_area`
    pub fn dough_conversion_ratio(&self, total_area: f64, percent_variation: f64) -> f64 {
        let base = self.config.percentage_base;
        let dough_weight = total_area * self.config.dough_weight_per_area;
        dough_weight * (1.0 + percent_variation / base) / base
    }

    fn validate_recipe(&self, recipe: &Recipe) -> Result<()> {
        let dough = &recipe.dough;
        let reference = dough
            .ingredients
            .first()
            .ok_or_else(|| Error::InvalidBaseRecipe("dough has no ingredients".to_string()))?;
        if !(reference.amount > 0.0) {
            return Err(Error::InvalidBaseRecipe(format!(
                "reference ingredient {} has non-positive amount {}",
                reference.name, reference.amount
            )));
        }
        check_amounts("dough", &dough.ingredients)?;

        if dough.percent_variation <= -self.config.percentage_base
            || !dough.percent_variation.is_finite()
        {
            return Err(Error::InvalidBaseRecipe(format!(
                "percent variation {} leaves no dough",
                dough.percent_variation
            )));
        }

        if let Some(topping) = &recipe.topping {
            if !(topping.reference_area > 0.0 && topping.reference_area.is_finite()) {
                return Err(Error::InvalidBaseRecipe(format!(
                    "topping reference area {} must be positive",
                    topping.reference_area
                )));
            }
            check_amounts("topping", &topping.ingredients)?;
        }
        Ok(())
    }
}

/// Every pan area must be positive, match its geometry, and sum to `total_area`
fn validate_pans(pans: &Pans) -> Result<()> {
    let invalid = || Error::InvalidTotalWeight {
        total: pans.total_area,
    };

    let mut sum = 0.0;
    for pan in &pans.pans {
        if !(pan.area > 0.0 && pan.area.is_finite())
            || (pan.area - pan.geometry.area()).abs() > AREA_TOLERANCE
        {
            return Err(invalid());
        }
        sum += pan.area;
    }

    if (sum - pans.total_area).abs() > AREA_TOLERANCE {
        return Err(invalid());
    }
    Ok(())
}

fn check_amounts(part: &str, ingredients: &[Ingredient]) -> Result<()> {
    match ingredients
        .iter()
        .find(|i| !(i.amount >= 0.0 && i.amount.is_finite()))
    {
        Some(bad) => Err(Error::InvalidBaseRecipe(format!(
            "{} ingredient {} has invalid amount {}",
            part, bad.name, bad.amount
        ))),
        None => Ok(()),
    }
}

fn scale_ingredients(ingredients: &[Ingredient], ratio: f64) -> Vec<Ingredient> {
    ingredients
        .iter()
        .map(|i| Ingredient {
            name: i.name.clone(),
            amount: round1(i.amount * ratio),
        })
        .collect()
}

/// Round to one decimal place, halves away from zero
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pans::{Pan, PanGeometry};
    use uuid::Uuid;

    fn pizza_dough(percent_variation: f64) -> Dough {
        Dough {
            name: "pizza".to_string(),
            percent_variation,
            ingredients: vec![
                Ingredient::new("flour", 55.7),
                Ingredient::new("water", 41.6),
                Ingredient::new("salt", 1.1),
                Ingredient::new("evoOil", 1.1),
                Ingredient::new("yeast", 0.5),
            ],
        }
    }

    fn recipe(dough: Dough, topping: Option<Topping>) -> Recipe {
        Recipe {
            id: 1,
            uuid: Uuid::nil(),
            name: "Test Recipe".to_string(),
            description: String::new(),
            author: String::new(),
            dough,
            topping,
            steps: Vec::new(),
        }
    }

    /// 1 cm wide rectangular pans with the given areas, labelled "pan N"
    fn pans_with_areas(areas: &[u32]) -> Pans {
        let pans: Vec<Pan> = areas
            .iter()
            .enumerate()
            .map(|(i, &area)| Pan {
                geometry: PanGeometry::Rectangular {
                    width: 1,
                    length: area,
                },
                name: format!("pan {}", i + 1),
                area: f64::from(area),
            })
            .collect();
        Pans {
            total_area: pans.iter().map(|p| p.area).sum(),
            pans,
        }
    }

    fn sum(ingredients: &[Ingredient]) -> f64 {
        ingredients.iter().map(|i| i.amount).sum()
    }

    #[test]
    fn test_two_equal_pans() {
        let balancer = IngredientsBalancer::default();
        let result = balancer
            .balance(&recipe(pizza_dough(0.0), None), &pans_with_areas(&[500, 500]))
            .unwrap();

        assert!((result.recipe.dough.total() - 1000.0).abs() <= 0.1);
        assert_eq!(result.recipe.dough.ingredients[0].amount, 557.0);

        let split = &result.split_ingredients.split_dough;
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].ingredients, split[1].ingredients);
        assert!((sum(&split[0].ingredients) - 500.0).abs() <= 0.1);
        assert!(result.split_ingredients.split_topping.is_empty());
    }

    #[test]
    fn test_percent_variation() {
        let balancer = IngredientsBalancer::default();
        let result = balancer
            .balance(
                &recipe(pizza_dough(10.0), None),
                &pans_with_areas(&[1000, 1000]),
            )
            .unwrap();

        assert!((result.recipe.dough.total() - 2200.0).abs() <= 0.1);
        assert!((result.recipe.dough.ingredients[0].amount - 55.7 * 22.0).abs() <= 0.1);
        assert_eq!(result.recipe.dough.percent_variation, 10.0);
    }

    #[test]
    fn test_half_area_weight_constant() {
        let balancer = IngredientsBalancer::new(BalancerConfig {
            dough_weight_per_area: 0.5,
            ..BalancerConfig::default()
        });
        let result = balancer
            .balance(&recipe(pizza_dough(0.0), None), &pans_with_areas(&[1000]))
            .unwrap();

        assert!((result.recipe.dough.total() - 500.0).abs() <= 0.1);
    }

    #[test]
    fn test_split_sums_match_total() {
        let balancer = IngredientsBalancer::default();
        let pans = pans_with_areas(&[1964, 400, 1200, 77]);
        let result = balancer
            .balance(&recipe(pizza_dough(-10.0), None), &pans)
            .unwrap();

        let split = &result.split_ingredients.split_dough;
        assert_eq!(split.len(), pans.pans.len());
        for (k, total) in result.recipe.dough.ingredients.iter().enumerate() {
            let split_sum: f64 = split.iter().map(|d| d.ingredients[k].amount).sum();
            // one rounding step of at most 0.05 per pan
            let tolerance = 0.05 * split.len() as f64 + 1e-9;
            assert!(
                (split_sum - total.amount).abs() <= tolerance,
                "{}: split sum {} vs total {}",
                total.name,
                split_sum,
                total.amount
            );
        }
    }

    #[test]
    fn test_split_names_follow_pans() {
        let balancer = IngredientsBalancer::default();
        let result = balancer
            .balance(&recipe(pizza_dough(0.0), None), &pans_with_areas(&[300, 700]))
            .unwrap();

        let names: Vec<&str> = result
            .split_ingredients
            .split_dough
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["pan 1", "pan 2"]);
    }

    #[test]
    fn test_topping_scaled_and_split() {
        let topping = Topping {
            name: "margherita".to_string(),
            reference_area: 1200.0,
            ingredients: vec![
                Ingredient::new("peeledTomatoes", 300.0),
                Ingredient::new("mozzarellaCheese", 250.0),
                Ingredient::new("basil", 15.0),
            ],
        };
        let balancer = IngredientsBalancer::default();
        let result = balancer
            .balance(
                &recipe(pizza_dough(0.0), Some(topping)),
                &pans_with_areas(&[1200, 1200]),
            )
            .unwrap();

        let scaled = result.recipe.topping.as_ref().unwrap();
        assert_eq!(scaled.reference_area, 2400.0);
        assert_eq!(scaled.ingredients[0].amount, 600.0);
        assert_eq!(scaled.ingredients[2].amount, 30.0);

        let split = &result.split_ingredients.split_topping;
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].reference_area, 1200.0);
        assert_eq!(split[0].ingredients[0].amount, 300.0);
        assert_eq!(split[1].name, "pan 2");
    }

    #[test]
    fn test_recipe_fields_are_kept() {
        let base = recipe(pizza_dough(0.0), None);
        let result = IngredientsBalancer::default()
            .balance(&base, &pans_with_areas(&[1000]))
            .unwrap();

        assert_eq!(result.recipe.uuid, base.uuid);
        assert_eq!(result.recipe.name, base.name);
        assert_eq!(result.recipe.dough.name, "pizza");
    }

    #[test]
    fn test_invalid_total_weight() {
        let balancer = IngredientsBalancer::default();
        for total in [0.0, -10.0, f64::NAN] {
            let pans = Pans {
                pans: Vec::new(),
                total_area: total,
            };
            let err = balancer
                .balance(&recipe(pizza_dough(0.0), None), &pans)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidTotalWeight { .. }));
        }
    }

    #[test]
    fn test_total_area_must_match_pans() {
        let balancer = IngredientsBalancer::default();
        let base = recipe(pizza_dough(0.0), None);

        let mut overstated = pans_with_areas(&[500, 500]);
        overstated.total_area = 1500.0;
        let mut no_pans = pans_with_areas(&[]);
        no_pans.total_area = 100.0;

        for pans in [overstated, no_pans] {
            let err = balancer.balance(&base, &pans).unwrap_err();
            assert!(matches!(err, Error::InvalidTotalWeight { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_pan_areas_must_match_geometry() {
        let balancer = IngredientsBalancer::default();
        let base = recipe(pizza_dough(0.0), None);

        // negative area with a total that still balances to a positive number
        let mut negative = pans_with_areas(&[500, 300]);
        negative.pans[1].area = -300.0;
        negative.total_area = 200.0;

        let mut inflated = pans_with_areas(&[500]);
        inflated.pans[0].area = 5000.0;
        inflated.total_area = 5000.0;

        let mut not_finite = pans_with_areas(&[500]);
        not_finite.pans[0].area = f64::INFINITY;

        for pans in [negative, inflated, not_finite] {
            let err = balancer.balance(&base, &pans).unwrap_err();
            assert!(matches!(err, Error::InvalidTotalWeight { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_empty_base_recipe() {
        let empty = Dough {
            ingredients: Vec::new(),
            ..pizza_dough(0.0)
        };
        let err = IngredientsBalancer::default()
            .balance(&recipe(empty, None), &pans_with_areas(&[1000]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBaseRecipe(_)));
    }

    #[test]
    fn test_total_weight_checked_before_recipe() {
        let empty = Dough {
            ingredients: Vec::new(),
            ..pizza_dough(0.0)
        };
        let pans = Pans {
            pans: Vec::new(),
            total_area: 0.0,
        };
        let err = IngredientsBalancer::default()
            .balance(&recipe(empty, None), &pans)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTotalWeight { .. }));
    }

    #[test]
    fn test_invalid_base_recipes() {
        let pans = pans_with_areas(&[1000]);
        let balancer = IngredientsBalancer::default();

        let mut zero_reference = pizza_dough(0.0);
        zero_reference.ingredients[0].amount = 0.0;
        let mut negative = pizza_dough(0.0);
        negative.ingredients[3].amount = -1.0;
        let no_dough_left = pizza_dough(-100.0);

        for dough in [zero_reference, negative, no_dough_left] {
            let err = balancer.balance(&recipe(dough, None), &pans).unwrap_err();
            assert!(matches!(err, Error::InvalidBaseRecipe(_)));
        }

        let bad_topping = Topping {
            name: String::new(),
            reference_area: 0.0,
            ingredients: vec![Ingredient::new("basil", 15.0)],
        };
        let err = balancer
            .balance(&recipe(pizza_dough(0.0), Some(bad_topping)), &pans)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBaseRecipe(_)));
    }

    #[test]
    fn test_idempotent() {
        let balancer = IngredientsBalancer::default();
        let base = recipe(pizza_dough(7.5), None);
        let pans = pans_with_areas(&[616, 400]);

        let first = balancer.balance(&base, &pans).unwrap();
        let second = balancer.balance(&base, &pans).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(10.56), 10.6);
        assert_eq!(round1(10.54), 10.5);
        assert_eq!(round1(10.50), 10.5);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(0.0), 0.0);
        assert_eq!(round1(-10.56), -10.6);
    }

    #[test]
    fn test_config_validation() {
        assert!(BalancerConfig::default().validate().is_ok());
        let bad = BalancerConfig {
            dough_weight_per_area: 0.0,
            ..BalancerConfig::default()
        };
        assert!(matches!(bad.validate(), Err(Error::Config(_))));
        let bad = BalancerConfig {
            percentage_base: -1.0,
            ..BalancerConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
