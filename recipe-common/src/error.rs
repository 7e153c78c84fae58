//! Common error types for the recipe services

use thiserror::Error;

/// Common result type for recipe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds shared by the engine, the recipe manager and the remote engine
///
/// Every variant carries the offending value so the HTTP layer can produce an
/// actionable message without re-inspecting the request.
#[derive(Error, Debug)]
pub enum Error {
    /// Pan shape name is not one of round, square, rectangular
    #[error("Unsupported shape: {shape}")]
    UnsupportedShape { shape: String },

    /// Required pan measure is absent, non-numeric or non-positive
    #[error("Invalid measurement for {shape} pan: {field} = {value}")]
    InvalidMeasurement {
        shape: String,
        field: String,
        value: String,
    },

    /// Total pan area is not positive or does not match the pans it claims to sum
    #[error("Invalid total weight: total area {total} is not a positive sum of pan areas")]
    InvalidTotalWeight { total: f64 },

    /// Stored recipe cannot be scaled
    #[error("Invalid base recipe: {0}")]
    InvalidBaseRecipe(String),

    /// No recipe stored under the requested identifier
    #[error("Recipe not found: {0}")]
    RecipeNotFound(uuid::Uuid),

    /// Remote engine call failed (connection, timeout, unexpected response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored JSON column could not be decoded
    #[error("Stored data error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code, used in HTTP error bodies
    ///
    /// The remote engine client maps these codes back through
    /// [`crate::api::types::ErrorBody::into_error`], so both ends must agree on the
    /// spelling.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedShape { .. } => "UNSUPPORTED_SHAPE",
            Error::InvalidMeasurement { .. } => "INVALID_MEASUREMENT",
            Error::InvalidTotalWeight { .. } => "INVALID_TOTAL_WEIGHT",
            Error::InvalidBaseRecipe(_) => "INVALID_BASE_RECIPE",
            Error::RecipeNotFound(_) => "RECIPE_NOT_FOUND",
            Error::Transport(_) => "TRANSPORT_ERROR",
            #[cfg(feature = "sqlx")]
            Error::Database(_) => "INTERNAL_ERROR",
            Error::Serialization(_) | Error::Io(_) | Error::Config(_) => "INTERNAL_ERROR",
        }
    }
}
