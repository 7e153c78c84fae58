//! Shared API request/response types
//!
//! All JSON keys are camelCase. Successful recipe-manager responses are wrapped
//! in `{"data": ...}`; errors from either service use [`ErrorResponse`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pans::{Pans, RawPan};
use crate::recipe::{Dough, Ingredient, Recipe, RecipeAggregate, Topping};
use crate::Error;

// ========================================
// Request Types
// ========================================

/// Body of `POST /recipes/{uuid}/aggregate` and `POST /pans/total`
///
/// # Examples
///
/// ```
/// use recipe_common::api::types::PanRequest;
///
/// let body = r#"{"pans":[{"shape":"round","measures":{"diameter":"28"}}]}"#;
/// let request: PanRequest = serde_json::from_str(body).unwrap();
/// assert_eq!(request.pans[0].shape, "round");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanRequest {
    pub pans: Vec<RawPan>,
}

/// Body of `POST /balance` on the remote engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub recipe: Recipe,
    pub pans: Pans,
}

// ========================================
// Response Types
// ========================================

/// `{"data": ...}` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughResponse {
    pub name: String,
    pub percent_variation: f64,
    pub ingredients: Vec<Ingredient>,
    pub total: f64,
}

impl From<&Dough> for DoughResponse {
    fn from(dough: &Dough) -> Self {
        Self {
            name: dough.name.clone(),
            percent_variation: dough.percent_variation,
            ingredients: dough.ingredients.clone(),
            total: round_total(dough.total()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToppingResponse {
    pub name: String,
    pub reference_area: f64,
    pub ingredients: Vec<Ingredient>,
    pub total: f64,
}

impl From<&Topping> for ToppingResponse {
    fn from(topping: &Topping) -> Self {
        Self {
            name: topping.name.clone(),
            reference_area: topping.reference_area,
            ingredients: topping.ingredients.clone(),
            total: round_total(topping.total()),
        }
    }
}

/// Sums of one-decimal amounts pick up float noise; keep the wire value clean
fn round_total(total: f64) -> f64 {
    crate::balancer::round1(total)
}

/// Recipe as returned to clients (the numeric id stays internal)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub author: String,
    pub dough: DoughResponse,
    pub topping: Option<ToppingResponse>,
    pub steps: Vec<String>,
}

impl From<&Recipe> for RecipeResponse {
    fn from(recipe: &Recipe) -> Self {
        Self {
            uuid: recipe.uuid,
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            author: recipe.author.clone(),
            dough: DoughResponse::from(&recipe.dough),
            topping: recipe.topping.as_ref().map(ToppingResponse::from),
            steps: recipe.steps.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitIngredientsResponse {
    pub split_dough: Vec<DoughResponse>,
    pub split_topping: Vec<ToppingResponse>,
}

/// Scaled recipe plus per-pan breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAggregateResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    pub split_ingredients: SplitIngredientsResponse,
}

impl From<&RecipeAggregate> for RecipeAggregateResponse {
    fn from(aggregate: &RecipeAggregate) -> Self {
        let split = &aggregate.split_ingredients;
        Self {
            recipe: RecipeResponse::from(&aggregate.recipe),
            split_ingredients: SplitIngredientsResponse {
                split_dough: split.split_dough.iter().map(DoughResponse::from).collect(),
                split_topping: split
                    .split_topping
                    .iter()
                    .map(ToppingResponse::from)
                    .collect(),
            },
        }
    }
}

// ========================================
// Error Response Types
// ========================================

/// `{"error": {...}}` body returned by both services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, see [`Error::code`]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Structured context of engine errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

/// Offending values carried by engine errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// Rebuild the engine error described by this body
    ///
    /// Used by the remote engine clients so that a remote failure surfaces as the
    /// same error kind as a local one. Unknown codes and incomplete details
    /// become `Transport` errors.
    pub fn into_error(self) -> Error {
        let detail = self.detail.unwrap_or_default();
        let rebuilt = match self.code.as_str() {
            "UNSUPPORTED_SHAPE" => detail.shape.map(|shape| Error::UnsupportedShape { shape }),
            "INVALID_MEASUREMENT" => match (detail.shape, detail.field, detail.value) {
                (Some(shape), Some(field), Some(value)) => {
                    Some(Error::InvalidMeasurement { shape, field, value })
                }
                _ => None,
            },
            "INVALID_TOTAL_WEIGHT" => detail.total.map(|total| Error::InvalidTotalWeight { total }),
            "INVALID_BASE_RECIPE" => detail.reason.map(Error::InvalidBaseRecipe),
            "RECIPE_NOT_FOUND" => detail.uuid.map(Error::RecipeNotFound),
            _ => None,
        };
        rebuilt.unwrap_or_else(|| Error::Transport(format!("{}: {}", self.code, self.message)))
    }
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let detail = match err {
            Error::UnsupportedShape { shape } => Some(ErrorDetail {
                shape: Some(shape.clone()),
                ..Default::default()
            }),
            Error::InvalidMeasurement { shape, field, value } => Some(ErrorDetail {
                shape: Some(shape.clone()),
                field: Some(field.clone()),
                value: Some(value.clone()),
                ..Default::default()
            }),
            Error::InvalidTotalWeight { total } => Some(ErrorDetail {
                // NaN is not representable in JSON
                total: Some(if total.is_finite() { *total } else { 0.0 }),
                ..Default::default()
            }),
            Error::InvalidBaseRecipe(reason) => Some(ErrorDetail {
                reason: Some(reason.clone()),
                ..Default::default()
            }),
            Error::RecipeNotFound(uuid) => Some(ErrorDetail {
                uuid: Some(*uuid),
                ..Default::default()
            }),
            _ => None,
        };

        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            detail,
        }
    }
}

// ========================================
// Tests
// ========================================
