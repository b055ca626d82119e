//! Rolling-origin backtesting

use crate::config::EvaluationConfig;
use crate::error::{ForecastError, Result};
use crate::metrics::{forecast_accuracy, interval_coverage};
use crate::models::{FittedForecaster, ForecastPoint, Forecaster, FutureFrame};
use crate::table::FeatureTable;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Forecasts made from one cutoff with the values that were later observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffForecast {
    /// Last training date
    pub cutoff: NaiveDate,
    /// Forecasts for the rows after the cutoff
    pub points: Vec<ForecastPoint>,
    /// Observed closes on the same rows
    pub actuals: Vec<f64>,
}

/// Accuracy at one forecast step, aggregated over all cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonMetrics {
    /// Step after the cutoff, starting at 1
    pub horizon: usize,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error, in percent
    pub smape: f64,
    /// Share of actuals inside the band
    pub coverage: f64,
    /// Number of cutoffs contributing
    pub samples: usize,
}

/// Result of a rolling-origin backtest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrossValidationReport {
    cutoffs: Vec<CutoffForecast>,
    metrics: Vec<HorizonMetrics>,
}

impl CrossValidationReport {
    /// Per-cutoff forecasts, in cutoff order
    pub fn cutoffs(&self) -> &[CutoffForecast] {
        &self.cutoffs
    }

    /// Per-step metrics, step 1 first
    pub fn metrics(&self) -> &[HorizonMetrics] {
        &self.metrics
    }

    /// True when the history was too short for a single cutoff
    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    /// MAPE averaged over all steps
    pub fn mean_mape(&self) -> Option<f64> {
        mean(self.metrics.iter().map(|m| m.mape))
    }

    /// Band coverage averaged over all steps
    pub fn mean_coverage(&self) -> Option<f64> {
        mean(self.metrics.iter().map(|m| m.coverage))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Training-row counts at which forecasts are issued.
///
/// Cutoffs are `initial, initial + period, ...` while `cutoff + horizon <= len`.
pub fn cutoff_indices(len: usize, config: &EvaluationConfig) -> Vec<usize> {
    let needed = config.initial + config.horizon;
    if len < needed || config.period == 0 {
        return Vec::new();
    }
    let count = (len - needed) / config.period + 1;
    (0..count).map(|k| config.initial + k * config.period).collect()
}

/// Backtest `forecaster` on `history`, refitting from scratch at each cutoff.
///
/// Rows after a cutoff are forecast with their observed regressor values.
/// Cutoffs run in parallel; results keep cutoff order.
pub fn cross_validate<F: Forecaster>(
    forecaster: &F,
    history: &FeatureTable,
    config: &EvaluationConfig,
) -> Result<CrossValidationReport> {
    config.validate()?;

    let cutoffs = cutoff_indices(history.len(), config);
    if cutoffs.is_empty() {
        warn!(
            rows = history.len(),
            initial = config.initial,
            horizon = config.horizon,
            "history too short for a single backtest cutoff"
        );
        return Ok(CrossValidationReport::default());
    }

    info!(
        cutoffs = cutoffs.len(),
        initial = config.initial,
        period = config.period,
        horizon = config.horizon,
        "running cross-validation"
    );

    let forecasts = cutoffs
        .par_iter()
        .map(|&cutoff| backtest_cutoff(forecaster, history, cutoff, config.horizon))
        .collect::<Result<Vec<_>>>()?;

    let metrics = horizon_metrics(&forecasts, config.horizon)?;
    let report = CrossValidationReport {
        cutoffs: forecasts,
        metrics,
    };

    if let Some(mape) = report.mean_mape() {
        info!(mean_mape = mape, "cross-validation complete");
    }
    Ok(report)
}

fn backtest_cutoff<F: Forecaster>(
    forecaster: &F,
    history: &FeatureTable,
    cutoff: usize,
    horizon: usize,
) -> Result<CutoffForecast> {
    let train = history.slice(0, cutoff)?;
    let test = history.slice(cutoff, cutoff + horizon)?;

    let cutoff_date = train
        .last()
        .map(|r| r.date)
        .ok_or_else(|| ForecastError::DataUnavailable("Empty training window".to_string()))?;

    let fitted = forecaster.train(&train)?;
    let points = fitted.predict_frame(&FutureFrame::from_table(&test))?;

    Ok(CutoffForecast {
        cutoff: cutoff_date,
        points,
        actuals: test.closes(),
    })
}

fn horizon_metrics(forecasts: &[CutoffForecast], horizon: usize) -> Result<Vec<HorizonMetrics>> {
    (0..horizon)
        .map(|step| {
            let yhat: Vec<f64> = forecasts.iter().map(|f| f.points[step].yhat).collect();
            let actual: Vec<f64> = forecasts.iter().map(|f| f.actuals[step]).collect();
            let bounds: Vec<(f64, f64)> = forecasts
                .iter()
                .map(|f| (f.points[step].yhat_lower, f.points[step].yhat_upper))
                .collect();

            let accuracy = forecast_accuracy(&yhat, &actual)?;
            Ok(HorizonMetrics {
                horizon: step + 1,
                mae: accuracy.mae,
                mse: accuracy.mse,
                rmse: accuracy.rmse,
                mape: accuracy.mape,
                smape: accuracy.smape,
                coverage: interval_coverage(&actual, &bounds)?,
                samples: forecasts.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_indices() {
        let config = EvaluationConfig::new(100, 20, 10).unwrap();
        // floor((150 - 100 - 10) / 20) + 1 = 3
        assert_eq!(cutoff_indices(150, &config), vec![100, 120, 140]);
        assert_eq!(cutoff_indices(110, &config), vec![100]);
        assert!(cutoff_indices(109, &config).is_empty());
    }

    #[test]
    fn test_mean_of_empty_report() {
        let report = CrossValidationReport::default();
        assert!(report.is_empty());
        assert_eq!(report.mean_mape(), None);
    }
}
