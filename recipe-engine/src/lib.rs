//! recipe-engine library
//!
//! Stateless HTTP front end to the pan calculator and ingredient balancer, used
//! by recipe-manager when `engine.mode = "remote"`.

use std::sync::Arc;

use axum::Router;
use recipe_common::IngredientsBalancer;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub balancer: Arc<IngredientsBalancer>,
}

impl AppState {
    pub fn new(balancer: IngredientsBalancer) -> Self {
        Self {
            balancer: Arc::new(balancer),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::post;

    Router::new()
        .route("/pans/total", post(api::total_pans_area))
        .route("/balance", post(api::balance))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(recipe_common::http::correlation_id))
}
