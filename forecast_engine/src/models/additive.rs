//! Additive trend + seasonality + regressor model.
//!
//! `y(t) = m + k·t + Σ δ_j·(t − s_j)₊ + weekly(t) + yearly(t) + Σ β_r·x_r(t)`
//!
//! Time is scaled to [0, 1] over the training span and the target by its
//! largest absolute value. Coefficients are the MAP estimate under Gaussian
//! priors, except the slope changes δ which get a Laplace prior. The Laplace
//! terms are majorized by quadratics so every pass is a ridge solve; the
//! observation variance is re-estimated after each solve.

use super::frame::FutureFrame;
use super::seasonality::Seasonality;
use super::trend::{changepoint_locations, hinges, trend_variance, TimeScale};
use super::{FittedForecaster, ForecastPoint, Forecaster};
use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::table::FeatureTable;
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::ops::Range;
use tracing::debug;

/// Prior variance of the offset and base slope
const TREND_PRIOR_VARIANCE: f64 = 25.0;
/// Lower bound on the scaled observation variance
const SIGMA2_FLOOR: f64 = 1e-6;
/// Lower bound on |δ| when reweighting the Laplace terms
const DELTA_FLOOR: f64 = 1e-6;
const RIDGE_JITTER: f64 = 1e-9;
const STD_EPSILON: f64 = 1e-12;

/// Trend + seasonality + regressor forecaster
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    config: ModelConfig,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            config: ModelConfig::default(),
        }
    }
}

impl AdditiveModel {
    /// Create a model with validated hyperparameters
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Hyperparameters
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn regressor_columns(&self, table: &FeatureTable) -> Result<Vec<usize>> {
        self.config
            .regressors
            .iter()
            .map(|name| {
                table.regressor_index(name).ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Regressor '{}' is not a column of the feature table",
                        name
                    ))
                })
            })
            .collect()
    }
}

impl Forecaster for AdditiveModel {
    type Fitted = FittedAdditiveModel;

    fn train(&self, table: &FeatureTable) -> Result<FittedAdditiveModel> {
        let rows = table.rows();
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(ForecastError::DataUnavailable(
                    "Cannot fit on an empty feature table".to_string(),
                ))
            }
        };
        if rows.len() < 2 || first == last {
            return Err(ForecastError::DataError(format!(
                "Fitting needs at least two rows spanning a day, got {}",
                rows.len()
            )));
        }

        let columns = self.regressor_columns(table)?;
        let n = rows.len();

        let mut regressor_means = Vec::with_capacity(columns.len());
        let mut regressor_stds = Vec::with_capacity(columns.len());
        for &c in &columns {
            let mean = rows.iter().map(|r| r.regressors[c]).sum::<f64>() / n as f64;
            let var = rows
                .iter()
                .map(|r| (r.regressors[c] - mean).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            let std = var.sqrt();
            regressor_means.push(mean);
            regressor_stds.push(if std > STD_EPSILON { std } else { 1.0 });
        }

        let time = TimeScale::new(first, last);
        let t: Vec<f64> = rows.iter().map(|r| time.scale(r.date)).collect();
        let changepoints = changepoint_locations(
            &t,
            self.config.n_changepoints,
            self.config.changepoint_range,
        );

        let seasonalities: Vec<Seasonality> = [
            Seasonality::weekly(self.config.weekly_fourier_order),
            Seasonality::yearly(self.config.yearly_fourier_order),
        ]
        .into_iter()
        .filter(|s| s.order() > 0)
        .filter(|s| {
            let fits = s.fits_span(time.span_days());
            if !fits {
                debug!(
                    component = s.name(),
                    span_days = time.span_days(),
                    period_days = s.period_days(),
                    "history shorter than two periods, component disabled"
                );
            }
            fits
        })
        .collect();

        let design = Design {
            time,
            changepoints,
            seasonalities,
            regressor_names: self.config.regressors.clone(),
            regressor_means,
            regressor_stds,
        };

        let y_scale = rows.iter().map(|r| r.close.abs()).fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let width = design.width();
        let mut flat = Vec::with_capacity(n * width);
        for row in rows {
            let values: Vec<f64> = columns.iter().map(|&c| row.regressors[c]).collect();
            flat.extend(design.row(row.date, &values));
        }
        let x = DMatrix::from_row_slice(n, width, &flat);
        let y = DVector::from_iterator(n, rows.iter().map(|r| r.close / y_scale));

        let solution = map_estimate(&x, &y, &design, &self.config)?;

        let deltas = &solution.beta.as_slice()[design.delta_range()];
        let delta_scale = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64 + 1e-8
        };

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?
            .inverse_cdf(0.5 + self.config.interval_width / 2.0);

        let fitted = FittedAdditiveModel {
            beta: solution.beta.iter().copied().collect(),
            sigma2: solution.sigma2,
            iterations: solution.iterations,
            y_scale,
            delta_scale,
            z,
            design,
        };

        debug!(
            rows = n,
            columns = width,
            changepoints = fitted.changepoint_dates().len(),
            seasonalities = ?fitted.seasonal_components(),
            iterations = fitted.iterations(),
            sigma = fitted.observation_sigma(),
            "additive model fitted"
        );

        Ok(fitted)
    }

    fn name(&self) -> &str {
        "Additive Trend-Seasonality"
    }
}

/// Column layout and input transforms shared by fitting and prediction
#[derive(Debug, Clone)]
struct Design {
    time: TimeScale,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    regressor_names: Vec<String>,
    regressor_means: Vec<f64>,
    regressor_stds: Vec<f64>,
}

impl Design {
    fn width(&self) -> usize {
        2 + self.changepoints.len()
            + self.seasonalities.iter().map(|s| s.width()).sum::<usize>()
            + self.regressor_names.len()
    }

    fn delta_range(&self) -> Range<usize> {
        2..2 + self.changepoints.len()
    }

    fn regressor_offset(&self) -> usize {
        self.width() - self.regressor_names.len()
    }

    /// Design row for a date; `regressors` follow `regressor_names`
    fn row(&self, date: NaiveDate, regressors: &[f64]) -> Vec<f64> {
        let t = self.time.scale(date);
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(t);
        row.extend(hinges(t, &self.changepoints));
        for seasonality in &self.seasonalities {
            seasonality.push_terms(date, &mut row);
        }
        for ((x, mean), std) in regressors
            .iter()
            .zip(&self.regressor_means)
            .zip(&self.regressor_stds)
        {
            row.push((x - mean) / std);
        }
        row
    }
}

struct MapSolution {
    beta: DVector<f64>,
    sigma2: f64,
    iterations: usize,
}

fn map_estimate(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    design: &Design,
    config: &ModelConfig,
) -> Result<MapSolution> {
    let n = x.nrows() as f64;
    let width = x.ncols();
    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;

    let deltas = design.delta_range();
    let regressor_offset = design.regressor_offset();
    let tau = config.changepoint_prior_scale;

    let mut prior_var: Vec<f64> = (0..width)
        .map(|j| {
            if j < 2 {
                TREND_PRIOR_VARIANCE
            } else if deltas.contains(&j) {
                tau * tau
            } else if j < regressor_offset {
                config.seasonality_prior_scale.powi(2)
            } else {
                config.regressor_prior_scale.powi(2)
            }
        })
        .collect();

    let y_mean = y.mean();
    let mut sigma2 = (y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>() / n).max(SIGMA2_FLOOR);
    let mut previous = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let mut a = xtx.clone();
        for (j, var) in prior_var.iter().enumerate() {
            a[(j, j)] += sigma2 / var + RIDGE_JITTER;
        }

        let cholesky = a.cholesky().ok_or_else(|| {
            ForecastError::NonConvergence("normal equations are not positive definite".to_string())
        })?;
        let beta = cholesky.solve(&xty);

        let residual = y - x * &beta;
        let ssr = residual.norm_squared();
        sigma2 = (ssr / n).max(SIGMA2_FLOOR);

        let penalty: f64 = beta
            .iter()
            .enumerate()
            .map(|(j, b)| {
                if deltas.contains(&j) {
                    b.abs() / tau
                } else {
                    b * b / (2.0 * prior_var[j])
                }
            })
            .sum();
        let objective = 0.5 * n * sigma2.ln() + ssr / (2.0 * sigma2) + penalty;

        if !objective.is_finite() || beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::NonConvergence(format!(
                "objective diverged at iteration {}",
                iteration
            )));
        }

        for j in deltas.clone() {
            prior_var[j] = tau * beta[j].abs().max(DELTA_FLOOR);
        }

        if (previous - objective).abs() <= config.tolerance * objective.abs().max(1.0) {
            return Ok(MapSolution {
                beta,
                sigma2,
                iterations: iteration,
            });
        }
        previous = objective;
    }

    Err(ForecastError::NonConvergence(format!(
        "objective still changing after {} iterations",
        config.max_iterations
    )))
}

/// Parameters of a fitted `AdditiveModel`
#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    design: Design,
    beta: Vec<f64>,
    sigma2: f64,
    iterations: usize,
    y_scale: f64,
    delta_scale: f64,
    z: f64,
}

impl FittedAdditiveModel {
    /// Optimizer passes used
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Residual standard deviation in price units
    pub fn observation_sigma(&self) -> f64 {
        self.sigma2.sqrt() * self.y_scale
    }

    /// Changepoint dates of the trend
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        let span = self.design.time.span_days();
        self.design
            .changepoints
            .iter()
            .map(|t| self.design.time.start() + chrono::Duration::days((t * span).round() as i64))
            .collect()
    }

    /// Seasonal components kept for this training span
    pub fn seasonal_components(&self) -> Vec<&str> {
        self.design.seasonalities.iter().map(|s| s.name()).collect()
    }

    /// Effect on price of a one-unit move in each regressor
    pub fn regressor_coefficients(&self) -> Vec<(String, f64)> {
        let offset = self.design.regressor_offset();
        self.design
            .regressor_names
            .iter()
            .zip(&self.design.regressor_stds)
            .enumerate()
            .map(|(i, (name, std))| (name.clone(), self.beta[offset + i] * self.y_scale / std))
            .collect()
    }
}

impl FittedForecaster for FittedAdditiveModel {
    fn predict_frame(&self, frame: &FutureFrame) -> Result<Vec<ForecastPoint>> {
        let columns: Vec<usize> = self
            .design
            .regressor_names
            .iter()
            .map(|name| {
                frame
                    .regressor_names()
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| {
                        ForecastError::DataError(format!(
                            "Prediction frame is missing regressor '{}'",
                            name
                        ))
                    })
            })
            .collect::<Result<_>>()?;

        let rate = self.design.changepoints.len() as f64;

        frame
            .rows()
            .iter()
            .map(|row| {
                let values = columns
                    .iter()
                    .map(|&c| {
                        row.regressors.get(c).copied().ok_or_else(|| {
                            ForecastError::DataError(format!(
                                "Prediction row {} is missing regressor values",
                                row.date
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;

                let x = self.design.row(row.date, &values);
                let yhat: f64 = x.iter().zip(&self.beta).map(|(a, b)| a * b).sum();

                let t = self.design.time.scale(row.date);
                let sd = (self.sigma2 + trend_variance(t, rate, self.delta_scale)).sqrt();
                let margin = self.z * sd;

                Ok(ForecastPoint {
                    date: row.date,
                    yhat: yhat * self.y_scale,
                    yhat_lower: (yhat - margin) * self.y_scale,
                    yhat_upper: (yhat + margin) * self.y_scale,
                })
            })
            .collect()
    }

    fn regressor_names(&self) -> &[String] {
        &self.design.regressor_names
    }

    fn name(&self) -> &str {
        "Additive Trend-Seasonality"
    }
}
