//! API module for shared HTTP API functionality
//!
//! Request, response and error body types used by both recipe services.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Shared serde types
//! - Pure conversions between domain values and wire shapes
//!
//! Axum middleware and the `IntoResponse` error live in [`crate::http`].

pub mod types;

pub use types::{
    BalanceRequest, DataResponse, ErrorBody, ErrorDetail, ErrorResponse, PanRequest,
    RecipeAggregateResponse, RecipeResponse,
};

/// Header carrying the request correlation id between services
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
