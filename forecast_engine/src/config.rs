//! Configuration for indicators, the forecasting model, backtests and the job binary.
//!
//! Every struct deserializes from TOML with `#[serde(default)]`, so a config
//! file only needs the values it wants to change.

use crate::error::{ForecastError, Result};
use crate::sentiment::SentimentSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rolling window sizes for the technical indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Short simple moving average window
    pub sma_short: usize,
    /// Long simple moving average window
    pub sma_long: usize,
    /// RSI lookback
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Validate the window sizes
    pub fn validate(&self) -> Result<()> {
        if self.sma_short == 0 || self.sma_long == 0 || self.rsi_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Indicator windows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of leading rows with at least one undefined indicator.
    ///
    /// An SMA(n) needs n rows, an RSI(n) needs n + 1.
    pub fn warmup_rows(&self) -> usize {
        self.sma_short
            .saturating_sub(1)
            .max(self.sma_long.saturating_sub(1))
            .max(self.rsi_period)
    }
}

/// Hyperparameters of the additive trend + seasonality + regressor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Laplace prior scale on trend slope changes (trend flexibility)
    pub changepoint_prior_scale: f64,
    /// Gaussian prior scale on Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Gaussian prior scale on regressor coefficients
    pub regressor_prior_scale: f64,
    /// Number of potential changepoints
    pub n_changepoints: usize,
    /// Share of history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Fourier order of the weekly component (0 disables it)
    pub weekly_fourier_order: usize,
    /// Fourier order of the yearly component (0 disables it)
    pub yearly_fourier_order: usize,
    /// Width of the uncertainty band
    pub interval_width: f64,
    /// Iteration cap for the MAP optimizer
    pub max_iterations: usize,
    /// Relative objective change at which the optimizer stops
    pub tolerance: f64,
    /// Exogenous regressors, in coefficient order
    pub regressors: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            regressor_prior_scale: 10.0,
            n_changepoints: 25,
            changepoint_range: 0.8,
            weekly_fourier_order: 3,
            yearly_fourier_order: 10,
            interval_width: 0.95,
            max_iterations: 1000,
            tolerance: 1e-6,
            regressors: Vec::new(),
        }
    }
}

impl ModelConfig {
    /// Replace the configured regressor list
    pub fn with_regressors<I, S>(mut self, regressors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regressors = regressors.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the hyperparameters
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
            ("regressor_prior_scale", self.regressor_prior_scale),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }

        if self.max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iterations must be greater than zero".to_string(),
            ));
        }

        for (i, name) in self.regressors.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ForecastError::InvalidParameter(
                    "Regressor names must not be empty".to_string(),
                ));
            }
            if self.regressors[..i].contains(name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Regressor '{}' is configured twice",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Rolling-origin backtest windows, counted in observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Rows in the first training window
    pub initial: usize,
    /// Rows between successive cutoffs
    pub period: usize,
    /// Rows forecast after each cutoff
    pub horizon: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            initial: 750,
            period: 120,
            horizon: 30,
        }
    }
}

impl EvaluationConfig {
    /// Create backtest windows
    pub fn new(initial: usize, period: usize, horizon: usize) -> Result<Self> {
        let config = Self {
            initial,
            period,
            horizon,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the windows
    pub fn validate(&self) -> Result<()> {
        if self.initial < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Initial window must hold at least 2 rows, got {}",
                self.initial
            )));
        }
        if self.period == 0 || self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Backtest period and horizon must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Spacing of the dates added beyond the last historical date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every calendar day
    #[default]
    Calendar,
    /// Monday to Friday only
    Business,
}

/// Settings for one end-to-end forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Days forecast beyond the last historical date
    pub horizon_days: usize,
    /// How horizon dates are spaced
    pub frequency: Frequency,
    /// Indicator windows
    pub indicators: IndicatorConfig,
    /// Model hyperparameters; the regressor list is taken from the auxiliary series
    pub model: ModelConfig,
    /// Backtest windows; no backtest runs when absent
    pub evaluation: Option<EvaluationConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            frequency: Frequency::Calendar,
            indicators: IndicatorConfig::default(),
            model: ModelConfig::default(),
            evaluation: None,
        }
    }
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon_days must be greater than zero".to_string(),
            ));
        }
        self.indicators.validate()?;
        self.model.validate()?;
        if let Some(evaluation) = &self.evaluation {
            evaluation.validate()?;
        }
        Ok(())
    }
}

/// A named price series stored as CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSource {
    /// Column name used for the series in the feature table
    pub name: String,
    /// CSV file with `date` and `close` columns
    pub path: PathBuf,
}

/// Input files for the job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Forecast target
    pub primary: SeriesSource,
    /// Exogenous regressor series
    #[serde(default)]
    pub auxiliary: Vec<SeriesSource>,
}

/// Optional artifacts written by the job for downstream collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Feature table as CSV (chart renderer input)
    pub history_csv: Option<PathBuf>,
    /// Forecast points as CSV (chart renderer input)
    pub forecast_csv: Option<PathBuf>,
    /// Insight record as JSON
    pub insight_json: Option<PathBuf>,
}

/// Top-level configuration of the `forecast_job` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Input series
    pub data: DataConfig,
    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Pre-computed headline sentiment
    #[serde(default)]
    pub sentiment: Option<SentimentSnapshot>,
    /// Output artifacts
    #[serde(default)]
    pub output: OutputConfig,
}

impl JobConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: JobConfig = toml::from_str(content)?;
        config.pipeline.validate()?;
        if let Some(sentiment) = &config.sentiment {
            sentiment.validate()?;
        }
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
