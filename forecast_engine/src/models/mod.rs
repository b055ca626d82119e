//! Forecasting models over a feature table

use crate::config::{EvaluationConfig, Frequency, ModelConfig};
use crate::error::{ForecastError, Result};
use crate::evaluation::{cross_validate, CrossValidationReport};
use crate::table::{write_dataframe_csv, FeatureTable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use tracing::info;

pub mod additive;
pub mod frame;
pub mod seasonality;
pub mod trend;

pub use additive::{AdditiveModel, FittedAdditiveModel};
pub use frame::{FrameRow, FutureFrame};

/// Point forecast with its uncertainty band for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date
    pub date: NaiveDate,
    /// Point forecast
    pub yhat: f64,
    /// Lower band edge
    pub yhat_lower: f64,
    /// Upper band edge
    pub yhat_upper: f64,
}

/// Forecaster that has been trained and can score prediction frames
pub trait FittedForecaster: Debug + Clone + Send + Sync {
    /// One forecast point per frame row, in frame order
    fn predict_frame(&self, frame: &FutureFrame) -> Result<Vec<ForecastPoint>>;

    /// Regressors the model was trained with
    fn regressor_names(&self) -> &[String];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecaster that can be trained on a feature table
pub trait Forecaster: Debug + Clone + Send + Sync {
    /// The type of trained model produced
    type Fitted: FittedForecaster;

    /// Train on every row of the table
    fn train(&self, table: &FeatureTable) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Output of `ForecastModel::predict`: fitted history followed by the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    points: Vec<ForecastPoint>,
    frame: FutureFrame,
    held_regressors: Vec<String>,
}

impl Forecast {
    /// All points, historical dates first
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Points on historical dates
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.frame.history_len()]
    }

    /// Points beyond the last historical date
    pub fn horizon(&self) -> &[ForecastPoint] {
        &self.points[self.frame.history_len()..]
    }

    /// Point on the last date of the extended axis
    pub fn final_point(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    /// Dates and regressor values the forecast was computed from
    pub fn frame(&self) -> &FutureFrame {
        &self.frame
    }

    /// Regressors assumed flat over the horizon
    pub fn held_regressors(&self) -> &[String] {
        &self.held_regressors
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the forecast is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Export as a polars DataFrame with `ds`, `yhat`, `yhat_lower`, `yhat_upper`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Series::new(
                "ds",
                self.points
                    .iter()
                    .map(|p| p.date.to_string())
                    .collect::<Vec<String>>(),
            ),
            Series::new(
                "yhat",
                self.points.iter().map(|p| p.yhat).collect::<Vec<f64>>(),
            ),
            Series::new(
                "yhat_lower",
                self.points.iter().map(|p| p.yhat_lower).collect::<Vec<f64>>(),
            ),
            Series::new(
                "yhat_upper",
                self.points.iter().map(|p| p.yhat_upper).collect::<Vec<f64>>(),
            ),
        ])?;
        Ok(df)
    }

    /// Write the forecast as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        write_dataframe_csv(&mut df, path)
    }
}

/// Lifecycle of a `ForecastModel`
#[derive(Debug, Clone)]
pub enum ModelState<T> {
    /// No parameters yet
    Unfitted,
    /// Trained parameters and the table they were trained on
    Fitted {
        /// Trained model
        params: T,
        /// Training rows, reused by `evaluate`
        history: FeatureTable,
    },
}

/// A forecaster plus its fit state.
///
/// A model is fitted exactly once; refitting means building a new model.
#[derive(Debug, Clone)]
pub struct ForecastModel<F: Forecaster = AdditiveModel> {
    forecaster: F,
    frequency: Frequency,
    state: ModelState<F::Fitted>,
}

impl ForecastModel<AdditiveModel> {
    /// Unfitted additive model with the given hyperparameters
    pub fn new(config: ModelConfig) -> Result<Self> {
        Ok(Self::with_forecaster(AdditiveModel::new(config)?))
    }
}

impl<F: Forecaster> ForecastModel<F> {
    /// Unfitted model around any forecaster
    pub fn with_forecaster(forecaster: F) -> Self {
        Self {
            forecaster,
            frequency: Frequency::default(),
            state: ModelState::Unfitted,
        }
    }

    /// Spacing of horizon dates used by `predict`
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Current state
    pub fn state(&self) -> &ModelState<F::Fitted> {
        &self.state
    }

    /// Check if the model has been fitted
    pub fn is_fitted(&self) -> bool {
        matches!(self.state, ModelState::Fitted { .. })
    }

    /// Train on the table. Fails if the model is already fitted.
    pub fn fit(&mut self, table: &FeatureTable) -> Result<()> {
        if self.is_fitted() {
            return Err(ForecastError::InvalidModelState(
                "Model is already fitted; build a new model to refit".to_string(),
            ));
        }
        if table.is_empty() {
            return Err(ForecastError::DataUnavailable(
                "Cannot fit on an empty feature table".to_string(),
            ));
        }

        info!(
            model = self.forecaster.name(),
            rows = table.len(),
            "fitting model on historical data"
        );
        let params = self.forecaster.train(table)?;
        self.state = ModelState::Fitted {
            params,
            history: table.clone(),
        };
        info!("model fitting complete");
        Ok(())
    }

    /// Forecast every date of `table` plus `horizon_days` dates beyond it.
    ///
    /// Regressors come from `table` on its own dates and hold their last value
    /// on the added dates.
    pub fn predict(&self, table: &FeatureTable, horizon_days: usize) -> Result<Forecast> {
        let params = self.fitted_params()?;

        info!(horizon_days, "generating forecast");
        let frame = FutureFrame::extend(table, horizon_days, self.frequency)?;
        let points = params.predict_frame(&frame)?;

        let held_regressors = frame
            .held_regressors()
            .iter()
            .filter(|name| params.regressor_names().contains(*name))
            .cloned()
            .collect();

        Ok(Forecast {
            points,
            frame,
            held_regressors,
        })
    }

    /// Rolling-origin backtest over the training history.
    ///
    /// Every cutoff trains a separate model; this one is left untouched.
    pub fn evaluate(&self, config: &EvaluationConfig) -> Result<CrossValidationReport> {
        match &self.state {
            ModelState::Fitted { history, .. } => cross_validate(&self.forecaster, history, config),
            ModelState::Unfitted => Err(ForecastError::InvalidModelState(
                "Model must be fitted before evaluating".to_string(),
            )),
        }
    }

    fn fitted_params(&self) -> Result<&F::Fitted> {
        match &self.state {
            ModelState::Fitted { params, .. } => Ok(params),
            ModelState::Unfitted => Err(ForecastError::InvalidModelState(
                "Model must be fitted before predicting".to_string(),
            )),
        }
    }
}
