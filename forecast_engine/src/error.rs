//! Error types for the forecast_engine crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_engine crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Empty or all-null input; the run must stop before fitting
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Predict/evaluate before fit, or a second fit on the same model
    #[error("Invalid model state: {0}")]
    InvalidModelState(String),

    /// Current price is zero or undefined, so no insight can be derived
    #[error("Degenerate market state: {0}")]
    DegenerateMarketState(String),

    /// The optimizer failed to produce a fit
    #[error("Model did not converge: {0}")]
    NonConvergence(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from indicator calculations
    #[error("Math error: {0}")]
    MathError(#[from] trade_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from configuration parsing
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
