//! Calculator and balancer endpoints
//!
//! Bodies and results are the plain domain types; the recipe-manager wraps
//! results for its own clients.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use recipe_common::api::{BalanceRequest, PanRequest};
use recipe_common::http::ApiResult;
use recipe_common::{Pans, RecipeAggregate};
use tracing::debug;

use crate::AppState;

/// POST /pans/total
pub async fn total_pans_area(
    body: Result<Json<PanRequest>, JsonRejection>,
) -> ApiResult<Json<Pans>> {
    let Json(request) = body?;
    let pans = recipe_common::total_pans_area(&request.pans)?;
    Ok(Json(pans))
}

/// POST /balance
pub async fn balance(
    State(state): State<AppState>,
    body: Result<Json<BalanceRequest>, JsonRejection>,
) -> ApiResult<Json<RecipeAggregate>> {
    let Json(request) = body?;
    let aggregate = state.balancer.balance(&request.recipe, &request.pans)?;
    debug!(
        recipe = %request.recipe.uuid,
        pans = request.pans.pans.len(),
        "Recipe balanced"
    );
    Ok(Json(aggregate))
}
