//! End-to-end run: align, derive features, fit, forecast, evaluate, synthesize

use crate::config::PipelineConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::evaluation::CrossValidationReport;
use crate::insight::{synthesize_insight, InsightRecord};
use crate::models::{Forecast, ForecastModel};
use crate::sentiment::SentimentSnapshot;
use crate::table::{FeatureTable, RegressorSeriesBuilder};
use tracing::info;

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Model input
    pub table: FeatureTable,
    /// Fitted history plus horizon
    pub forecast: Forecast,
    /// Backtest report, when configured
    pub evaluation: Option<CrossValidationReport>,
    /// Insight for the final horizon date
    pub insight: InsightRecord,
}

/// Runs the forecasting steps in order with a fresh model each time
#[derive(Debug, Clone, Default)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Create a pipeline with validated settings
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Settings in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the feature table only
    pub fn build_table(
        &self,
        primary: &PriceSeries,
        auxiliaries: &[PriceSeries],
    ) -> Result<FeatureTable> {
        let builder = RegressorSeriesBuilder::new(self.config.indicators.clone())?;
        let table = builder.build(primary, auxiliaries)?;
        if table.is_empty() {
            return Err(ForecastError::DataUnavailable(format!(
                "No usable rows for '{}' after alignment and indicator warm-up",
                primary.name()
            )));
        }
        Ok(table)
    }

    /// Run every step on the given series.
    ///
    /// All auxiliary series become model regressors. A sentiment score outside
    /// [-1, 1] is rejected before any work starts.
    pub fn run(
        &self,
        primary: &PriceSeries,
        auxiliaries: &[PriceSeries],
        sentiment: Option<&SentimentSnapshot>,
    ) -> Result<PipelineOutput> {
        if let Some(sentiment) = sentiment {
            sentiment.validate()?;
        }

        info!(
            target_series = primary.name(),
            auxiliaries = auxiliaries.len(),
            "starting forecast pipeline"
        );

        let table = self.build_table(primary, auxiliaries)?;
        let latest = table.last().cloned().ok_or_else(|| {
            ForecastError::DataUnavailable("Feature table has no rows".to_string())
        })?;
        info!(
            rows = table.len(),
            latest_date = %latest.date,
            latest_close = latest.close,
            "feature table ready"
        );

        let model_config = self
            .config
            .model
            .clone()
            .with_regressors(table.regressor_names().iter().cloned());
        let mut model = ForecastModel::new(model_config)?.with_frequency(self.config.frequency);
        model.fit(&table)?;

        let forecast = model.predict(&table, self.config.horizon_days)?;

        let evaluation = match &self.config.evaluation {
            Some(eval_config) => Some(model.evaluate(eval_config)?),
            None => None,
        };

        let final_point = forecast.final_point().ok_or_else(|| {
            ForecastError::DataUnavailable("Forecast produced no points".to_string())
        })?;
        let insight = synthesize_insight(&latest, final_point, self.config.horizon_days, sentiment)?
            .with_held_regressors(forecast.held_regressors().to_vec());

        info!(
            predicted_price = insight.predicted_price,
            pct_change = insight.pct_change,
            forecast_trend = %insight.forecast_trend,
            action = %insight.action,
            "insight generated"
        );

        Ok(PipelineOutput {
            table,
            forecast,
            evaluation,
            insight,
        })
    }
}
