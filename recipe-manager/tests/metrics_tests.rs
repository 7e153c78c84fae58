//! Tests for the Prometheus metrics endpoint
//!
//! The Prometheus recorder is process-wide, so it is installed once for this
//! test binary and every test reads the same registry. Counters only grow, so
//! assertions check for presence rather than exact totals.

use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use metrics_exporter_prometheus::PrometheusHandle;
use recipe_common::IngredientsBalancer;
use recipe_manager::db::{demo_recipe, init_memory_database, insert_recipe, SqliteRecipeRepository};
use recipe_manager::metrics::{install_prometheus, PrometheusMetrics};
use recipe_manager::{build_router, AppState, RecipeService};
use serde_json::json;
use tower::util::ServiceExt;
use uuid::Uuid;

fn prometheus() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| install_prometheus().expect("Should install recorder"))
        .clone()
}

async fn setup_app(with_exporter: bool) -> (axum::Router, Uuid) {
    let pool = init_memory_database().await.expect("Should create database");
    let recipe = demo_recipe();
    insert_recipe(&pool, &recipe)
        .await
        .expect("Should insert recipe");

    let service = RecipeService::local(
        Arc::new(SqliteRecipeRepository::new(pool)),
        IngredientsBalancer::default(),
    );
    let state = if with_exporter {
        let handle = prometheus();
        AppState::new(service.with_metrics(Arc::new(PrometheusMetrics::new())))
            .with_prometheus(handle)
    } else {
        AppState::new(service)
    };
    (build_router(state), recipe.uuid)
}

fn aggregate_request(uuid: Uuid, shape: &str) -> Request<Body> {
    let body = json!({"pans": [{"shape": shape, "measures": {"edge": "20"}}]});
    Request::builder()
        .method("POST")
        .uri(format!("/recipes/{}/aggregate", uuid))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn scrape(app: axum::Router) -> String {
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of the first sample of `name` carrying every label in `labels`
fn sample(rendered: &str, name: &str, labels: &[&str]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

#[tokio::test]
async fn test_successful_aggregation_is_counted() {
    let (app, uuid) = setup_app(true).await;
    let response = app
        .clone()
        .oneshot(aggregate_request(uuid, "square"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rendered = scrape(app).await;
    assert!(
        sample(&rendered, "recipe_manager_aggregations_total", &["outcome=\"ok\""]) >= Some(1.0),
        "{}",
        rendered
    );
    for stage in ["calculator", "database", "balancer"] {
        let label = format!("stage=\"{}\"", stage);
        assert!(
            sample(
                &rendered,
                "recipe_manager_stage_calls_total",
                &[&label, "outcome=\"ok\""]
            ) >= Some(1.0),
            "{}",
            rendered
        );
    }
    assert!(
        sample(&rendered, "recipe_manager_aggregation_duration_seconds_count", &[]) >= Some(1.0),
        "{}",
        rendered
    );
}

#[tokio::test]
async fn test_failed_aggregation_counted_by_error_type() {
    let (app, uuid) = setup_app(true).await;
    let response = app
        .clone()
        .oneshot(aggregate_request(uuid, "hexagon"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let rendered = scrape(app).await;
    assert!(
        sample(
            &rendered,
            "recipe_manager_aggregation_errors_total",
            &["error_type=\"UNSUPPORTED_SHAPE\""]
        ) >= Some(1.0),
        "{}",
        rendered
    );
    assert!(
        sample(
            &rendered,
            "recipe_manager_stage_calls_total",
            &["stage=\"calculator\"", "outcome=\"UNSUPPORTED_SHAPE\""]
        ) >= Some(1.0),
        "{}",
        rendered
    );
}

#[tokio::test]
async fn test_http_requests_labelled_by_route_template() {
    let (app, uuid) = setup_app(true).await;
    app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/recipes/{}", uuid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let rendered = scrape(app).await;
    assert!(
        sample(
            &rendered,
            "recipe_manager_http_requests_total",
            &[
                "method=\"GET\"",
                "endpoint=\"/recipes/:uuid\"",
                "status_code=\"200\""
            ]
        ) >= Some(1.0),
        "{}",
        rendered
    );
    // the raw uuid never becomes a label value
    assert!(!rendered.contains(&uuid.to_string()));
}

#[tokio::test]
async fn test_metrics_endpoint_without_exporter() {
    let (app, _) = setup_app(false).await;
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
