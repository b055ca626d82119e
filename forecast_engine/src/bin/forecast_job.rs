//! Scheduled forecast job.
//!
//! Usage: `forecast_job [forecast|signal]`
//!
//! Reads the TOML file named by `FORECAST_CONFIG` (default `config/forecast.toml`).
//! `forecast` (the default) runs the full pipeline; `signal` only reports the
//! indicator-based signal for the latest row.

use anyhow::{bail, Context};
use forecast_engine::delivery::{AlertSink, LogSink};
use forecast_engine::insight::TechnicalSnapshot;
use forecast_engine::render::{format_alert_message, format_price_signal};
use forecast_engine::{ForecastPipeline, JobConfig, PriceSeries};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "forecast".to_string());
    let config_path =
        std::env::var("FORECAST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = JobConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path))?;

    let primary = load_series(&config.data.primary.name, &config.data.primary.path)?;
    let auxiliaries = config
        .data
        .auxiliary
        .iter()
        .map(|source| load_series(&source.name, &source.path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let pipeline = ForecastPipeline::new(config.pipeline.clone())
        .context("invalid pipeline configuration")?;
    let sink = LogSink;

    match mode.as_str() {
        "forecast" => {
            let output = pipeline
                .run(&primary, &auxiliaries, config.sentiment.as_ref())
                .context("forecast pipeline failed")?;

            if let Some(path) = &config.output.history_csv {
                ensure_parent(path)?;
                output
                    .table
                    .write_csv(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "history written");
            }
            if let Some(path) = &config.output.forecast_csv {
                ensure_parent(path)?;
                output
                    .forecast
                    .write_csv(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "forecast written");
            }
            if let Some(path) = &config.output.insight_json {
                ensure_parent(path)?;
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(file, &output.insight)
                    .context("failed to serialize insight")?;
                info!(path = %path.display(), "insight written");
            }
            if let Some(report) = &output.evaluation {
                if let (Some(mape), Some(coverage)) = (report.mean_mape(), report.mean_coverage())
                {
                    info!(
                        cutoffs = report.cutoffs().len(),
                        mean_mape = mape,
                        mean_coverage = coverage,
                        "backtest summary"
                    );
                }
            }

            sink.deliver(&format_alert_message(&output.insight), None)
                .context("alert delivery failed")?;
        }
        "signal" => {
            let table = pipeline
                .build_table(&primary, &auxiliaries)
                .context("failed to build feature table")?;
            let latest = table.last().context("feature table has no rows")?;
            let snapshot = TechnicalSnapshot::from_row(latest)?;

            sink.deliver(
                &format_price_signal(&snapshot, config.sentiment.as_ref()),
                None,
            )
            .context("alert delivery failed")?;
        }
        other => bail!("unknown mode '{}', expected 'forecast' or 'signal'", other),
    }

    Ok(())
}

fn load_series(name: &str, path: &Path) -> anyhow::Result<PriceSeries> {
    let series = PriceSeries::from_csv(name, path)
        .with_context(|| format!("failed to load {} from {}", name, path.display()))?;
    info!(series = name, points = series.len(), "series loaded");
    Ok(series)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}
