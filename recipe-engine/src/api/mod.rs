//! HTTP API handlers for recipe-engine

pub mod engine;
pub mod health;

pub use engine::{balance, total_pans_area};
pub use health::health_routes;
