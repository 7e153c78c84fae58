//! Axum glue shared by the recipe services
//!
//! - Correlation id middleware (accept or generate `x-correlation-id`)
//! - `ApiError`, mapping engine errors to HTTP responses

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::types::{ErrorBody, ErrorResponse};
use crate::api::CORRELATION_ID_HEADER;

/// Longest caller-supplied correlation id that is trusted as-is
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Correlation id of the current request, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Correlation id middleware
///
/// Reuses the caller's `x-correlation-id` when present and sane, otherwise
/// generates one. The id is put into request extensions, recorded on a tracing
/// span wrapping the rest of the request, and echoed on the response.
pub async fn correlation_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_CORRELATION_ID_LEN)
        .map(|v| CorrelationId(v.to_string()))
        .unwrap_or_default();

    request.extensions_mut().insert(id.clone());

    let span = info_span!(
        "request",
        correlation_id = %id.as_str(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400) rejected before reaching the engine
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Engine, repository or transport error
    #[error(transparent)]
    Engine(#[from] crate::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(err) => engine_status(err),
        }
    }
}

fn engine_status(err: &crate::Error) -> StatusCode {
    use crate::Error;

    match err {
        Error::UnsupportedShape { .. } | Error::InvalidMeasurement { .. } => {
            StatusCode::BAD_REQUEST
        }
        Error::InvalidTotalWeight { .. } | Error::InvalidBaseRecipe(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::RecipeNotFound(_) => StatusCode::NOT_FOUND,
        Error::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg) => ErrorBody::new("BAD_REQUEST", msg.clone()),
            ApiError::Engine(err) => ErrorBody::from(err),
        };

        if status.is_server_error() {
            error!(code = %body.code, "{}", body.message);
        } else {
            warn!(code = %body.code, "{}", body.message);
        }

        (status, Json(ErrorResponse { error: body })).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
