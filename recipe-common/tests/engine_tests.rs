//! End-to-end tests of the scaling engine
//!
//! Tests cover:
//! - Pan areas per shape and their total
//! - Scaling the reference pizza dough to resolved pans
//! - Per-pan split sums against the unsplit totals
//! - Error propagation from pan resolution and balancing

use recipe_common::{
    total_pans_area, Dough, Error, Ingredient, IngredientsBalancer, Pans, RawPan, Recipe, Topping,
};
use uuid::Uuid;

fn base_recipe() -> Recipe {
    Recipe {
        id: 1,
        uuid: Uuid::new_v4(),
        name: "Teglia".to_string(),
        description: "Pan pizza".to_string(),
        author: "Test Author".to_string(),
        dough: Dough {
            name: String::new(),
            percent_variation: -10.0,
            ingredients: vec![
                Ingredient::new("flour", 60.0),
                Ingredient::new("water", 30.0),
                Ingredient::new("salt", 5.0),
                Ingredient::new("evoOil", 3.0),
                Ingredient::new("yeast", 2.0),
            ],
        },
        topping: Some(Topping {
            name: String::new(),
            reference_area: 1200.0,
            ingredients: vec![
                Ingredient::new("peeledTomatoes", 300.0),
                Ingredient::new("mozzarellaCheese", 250.0),
                Ingredient::new("basil", 15.0),
                Ingredient::new("evoOil", 15.0),
                Ingredient::new("parmesanCheese", 20.0),
            ],
        }),
        steps: vec!["Mix".to_string(), "Proof".to_string(), "Bake".to_string()],
    }
}

fn mixed_pans() -> Vec<RawPan> {
    vec![
        RawPan::new("round", &[("diameter", "50")]),
        RawPan::new("square", &[("edge", "20")]),
        RawPan::new("rectangular", &[("width", "30"), ("length", "40")]),
    ]
}

// =============================================================================
// Pan resolution
// =============================================================================

#[test]
fn test_reference_areas() {
    let pans = total_pans_area(&[
        RawPan::new("round", &[("diameter", "20")]),
        RawPan::new("square", &[("edge", "20")]),
        RawPan::new("rectangular", &[("width", "20"), ("length", "30")]),
    ])
    .unwrap();

    assert!((pans.pans[0].area - std::f64::consts::PI * 100.0).abs() < 1e-6);
    assert_eq!(pans.pans[1].area, 400.0);
    assert_eq!(pans.pans[2].area, 600.0);
    assert!((pans.total_area - (std::f64::consts::PI * 100.0 + 1000.0)).abs() < 1e-6);
}

#[test]
fn test_total_area_over_many_sizes() {
    for size in 1..=60u32 {
        let s = size.to_string();
        let request = vec![
            RawPan::new("round", &[("diameter", s.as_str())]),
            RawPan::new("square", &[("edge", s.as_str())]),
            RawPan::new("rectangular", &[("width", s.as_str()), ("length", "7")]),
        ];
        let pans = total_pans_area(&request).unwrap();
        let sum: f64 = pans.pans.iter().map(|p| p.area).sum();
        assert!((pans.total_area - sum).abs() < 1e-6, "size {}", size);
    }
}

// =============================================================================
// Balancing
// =============================================================================

#[test]
fn test_scales_to_resolved_pans() {
    let pans = total_pans_area(&mixed_pans()).unwrap();
    let recipe = base_recipe();
    let result = IngredientsBalancer::default().balance(&recipe, &pans).unwrap();

    // total area ≈ 1963.5 + 400 + 1200, minus 10 percent
    let expected_weight = pans.total_area * 0.9;
    assert!((result.recipe.dough.total() - expected_weight).abs() <= 0.3);

    let split = &result.split_ingredients;
    assert_eq!(split.split_dough.len(), 3);
    assert_eq!(split.split_topping.len(), 3);
    assert_eq!(split.split_dough[0].name, "round 50 cm");
    assert_eq!(split.split_topping[2].name, "rectangular 30 x 40 cm");
    assert_eq!(split.split_topping[1].reference_area, 400.0);

    for (k, total) in result.recipe.dough.ingredients.iter().enumerate() {
        let split_sum: f64 = split.split_dough.iter().map(|d| d.ingredients[k].amount).sum();
        assert!((split_sum - total.amount).abs() <= 0.16, "{}", total.name);
    }
    assert!(result
        .recipe
        .dough
        .ingredients
        .iter()
        .chain(split.split_dough.iter().flat_map(|d| d.ingredients.iter()))
        .all(|i| i.amount >= 0.0));
}

#[test]
fn test_reference_dough_two_pans() {
    let recipe = Recipe {
        topping: None,
        dough: Dough {
            name: String::new(),
            percent_variation: 0.0,
            ingredients: vec![
                Ingredient::new("flour", 55.7),
                Ingredient::new("water", 41.6),
                Ingredient::new("salt", 1.1),
                Ingredient::new("evoOil", 1.1),
                Ingredient::new("yeast", 0.5),
            ],
        },
        ..base_recipe()
    };
    // two 500 cm² pans: rectangles of 20 x 25
    let pans = total_pans_area(&[
        RawPan::new("rectangular", &[("width", "20"), ("length", "25")]),
        RawPan::new("rectangular", &[("width", "25"), ("length", "20")]),
    ])
    .unwrap();
    assert_eq!(pans.total_area, 1000.0);

    let result = IngredientsBalancer::default().balance(&recipe, &pans).unwrap();
    assert!((result.recipe.dough.total() - 1000.0).abs() <= 0.1);

    let split = &result.split_ingredients.split_dough;
    assert_eq!(split[0].ingredients, split[1].ingredients);
    for dough in split {
        assert!((dough.total() - 500.0).abs() <= 0.1);
    }
}

#[test]
fn test_bit_identical_reruns() {
    let pans = total_pans_area(&mixed_pans()).unwrap();
    let recipe = base_recipe();
    let balancer = IngredientsBalancer::default();

    let first = serde_json::to_string(&balancer.balance(&recipe, &pans).unwrap()).unwrap();
    let second = serde_json::to_string(&balancer.balance(&recipe, &pans).unwrap()).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unsupported_shape_yields_no_pans() {
    let mut request = mixed_pans();
    request.push(RawPan::new("triangle", &[("edge", "30")]));

    match total_pans_area(&request) {
        Err(Error::UnsupportedShape { shape }) => assert_eq!(shape, "triangle"),
        other => panic!("expected UnsupportedShape, got {:?}", other),
    }
}

#[test]
fn test_empty_pans_cannot_be_balanced() {
    let pans = total_pans_area(&[]).unwrap();
    assert_eq!(pans, Pans::default());

    let err = IngredientsBalancer::default()
        .balance(&base_recipe(), &pans)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTotalWeight { total } if total == 0.0));
}
