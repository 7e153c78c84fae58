//! recipe-manager library
//!
//! Stores recipes and scales them to a caller's pans. The pan calculator and
//! ingredient balancer run in-process or in a remote `recipe-engine`.

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod metrics;
pub mod remote;
pub mod service;

pub use service::RecipeService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecipeService>,
    /// Renders `GET /metrics`; `None` serves 404
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: RecipeService) -> Self {
        Self {
            service: Arc::new(service),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    build_router_with_cors(state, None)
}

/// Build application router, allowing browser calls from `cors` when given
pub fn build_router_with_cors(state: AppState, cors: Option<CorsLayer>) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let router = Router::new()
        .route("/recipes/:uuid", get(api::get_recipe))
        .route("/recipes/:uuid/aggregate", post(api::aggregate_recipe))
        .merge(api::health_routes())
        .merge(api::metrics_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::track_http_metrics,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    // Outermost: the request span wraps tracing and CORS
    router.layer(middleware::from_fn(recipe_common::http::correlation_id))
}
