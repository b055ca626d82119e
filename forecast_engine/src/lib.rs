//! # Forecast Engine
//!
//! Daily price forecasting for one target instrument, driven by auxiliary
//! market series, with rule-based trading insight on top.
//!
//! ## Features
//!
//! - Date alignment of a target with auxiliary series (auxiliaries forward-filled, target never imputed)
//! - SMA and RSI features computed without lookahead
//! - Additive trend + weekly/yearly seasonality + regressor model with uncertainty bands
//! - Rolling-origin backtesting with per-horizon accuracy metrics
//! - Insight records and alert rendering for downstream delivery
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forecast_engine::{ForecastPipeline, PipelineConfig, PriceSeries};
//!
//! # fn main() -> forecast_engine::error::Result<()> {
//! let gold = PriceSeries::from_csv("gold", "data/gold.csv")?;
//! let usd = PriceSeries::from_csv("usd_index", "data/dxy.csv")?;
//!
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let output = pipeline.run(&gold, &[usd], None)?;
//!
//! println!("{}", forecast_engine::render::format_alert_message(&output.insight));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod delivery;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod insight;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod sentiment;
pub mod table;

// Re-export commonly used types
pub use crate::config::{
    EvaluationConfig, Frequency, IndicatorConfig, JobConfig, ModelConfig, PipelineConfig,
};
pub use crate::data::{PricePoint, PriceSeries};
pub use crate::error::ForecastError;
pub use crate::evaluation::{CrossValidationReport, HorizonMetrics};
pub use crate::features::FeatureDeriver;
pub use crate::insight::{synthesize_insight, InsightRecord, TechnicalSnapshot};
pub use crate::models::{AdditiveModel, Forecast, ForecastModel, ForecastPoint, Forecaster};
pub use crate::pipeline::{ForecastPipeline, PipelineOutput};
pub use crate::sentiment::SentimentSnapshot;
pub use crate::table::{FeatureTable, PriceFeatureRow, RegressorSeriesBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
