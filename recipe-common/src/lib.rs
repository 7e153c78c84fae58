//! # Recipe Common Library
//!
//! Shared code for the recipe services including:
//! - Recipe and pan domain types
//! - Pan geometry resolution and area aggregation
//! - Ingredient balancing (scaling a recipe to a pan set)
//! - API request/response types
//! - Configuration loading
//! - Axum middleware and error responses shared by both services
//!
//! The engine (pans, calculator, balancer) is pure and synchronous.

pub mod api;
pub mod balancer;
pub mod calculator;
pub mod config;
pub mod error;
pub mod http;
pub mod pans;
pub mod recipe;

pub use balancer::{BalancerConfig, IngredientsBalancer};
pub use calculator::total_pans_area;
pub use error::{Error, Result};
pub use pans::{Pan, PanGeometry, Pans, RawPan};
pub use recipe::{Dough, Ingredient, Recipe, RecipeAggregate, SplitIngredients, Topping};
