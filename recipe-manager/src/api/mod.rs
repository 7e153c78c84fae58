//! HTTP API handlers for recipe-manager

pub mod health;
pub mod metrics;
pub mod recipes;

pub use health::health_routes;
pub use metrics::{metrics_routes, track_http_metrics};
pub use recipes::{aggregate_recipe, get_recipe};
