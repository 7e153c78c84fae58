//! Recipe endpoints
//!
//! - `GET /recipes/:uuid` returns the stored recipe unscaled
//! - `POST /recipes/:uuid/aggregate` scales it to the pans in the body

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use recipe_common::api::{DataResponse, PanRequest, RecipeAggregateResponse, RecipeResponse};
use recipe_common::http::{ApiError, ApiResult, CorrelationId};
use tracing::info;
use uuid::Uuid;

use crate::AppState;

fn parse_uuid(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid recipe UUID: {}", raw)))
}

/// GET /recipes/:uuid
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<DataResponse<RecipeResponse>>> {
    let uuid = parse_uuid(&uuid)?;
    let recipe = state.service.get_recipe(uuid).await?;
    Ok(Json(DataResponse::new(RecipeResponse::from(&recipe))))
}

/// POST /recipes/:uuid/aggregate
///
/// Body: `{"pans": [{"shape": "round", "measures": {"diameter": "28"}}]}`
pub async fn aggregate_recipe(
    State(state): State<AppState>,
    correlation: Option<Extension<CorrelationId>>,
    Path(uuid): Path<String>,
    body: Result<Json<PanRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<RecipeAggregateResponse>>> {
    let uuid = parse_uuid(&uuid)?;
    let Json(request) = body?;
    let ctx = correlation.map(|Extension(id)| id).unwrap_or_default();

    let aggregate = state.service.aggregate(&ctx, uuid, &request).await?;
    info!(
        recipe = %uuid,
        pans = request.pans.len(),
        dough_total = aggregate.recipe.dough.total(),
        "Recipe aggregated"
    );

    Ok(Json(DataResponse::new(RecipeAggregateResponse::from(&aggregate))))
}
