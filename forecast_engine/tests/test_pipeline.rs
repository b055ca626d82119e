use chrono::{Duration, NaiveDate};
use forecast_engine::config::{EvaluationConfig, PipelineConfig};
use forecast_engine::render::format_alert_message;
use forecast_engine::{
    ForecastError, ForecastPipeline, PriceSeries, RegressorSeriesBuilder, SentimentSnapshot,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

fn write_series<F>(days: i64, skip: impl Fn(i64) -> bool, close: F) -> NamedTempFile
where
    F: Fn(i64) -> f64,
{
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Close").unwrap();
    for i in 0..days {
        if skip(i) {
            continue;
        }
        let date = start() + Duration::days(i);
        writeln!(file, "{} 00:00:00-05:00,{:.4}", date, close(i)).unwrap();
    }
    file
}

fn gold_close(i: i64) -> f64 {
    1900.0 + 0.8 * i as f64 + 12.0 * (i as f64 / 9.0).sin()
}

fn load(name: &str, path: &Path) -> PriceSeries {
    PriceSeries::from_csv(name, path).unwrap()
}

#[test]
fn test_full_pipeline_with_regressors() {
    let gold_file = write_series(300, |_| false, gold_close);
    // USD index misses every seventh day and is forward-filled
    let usd_file = write_series(300, |i| i % 7 == 3, |i| 103.0 + (i as f64 / 17.0).cos());
    let yield_file = write_series(300, |_| false, |i| 4.1 + 0.002 * i as f64);

    let gold = load("gold", gold_file.path());
    let usd = load("usd_index", usd_file.path());
    let treasury = load("treasury_yield", yield_file.path());
    assert_eq!(usd.len(), 300 - 43);

    let config = PipelineConfig {
        horizon_days: 30,
        evaluation: Some(EvaluationConfig::new(150, 50, 10).unwrap()),
        ..PipelineConfig::default()
    };
    let pipeline = ForecastPipeline::new(config).unwrap();
    let output = pipeline.run(&gold, &[usd, treasury], None).unwrap();

    // 49 warm-up rows dropped
    assert_eq!(output.table.len(), 251);
    assert_eq!(
        output.table.regressor_names(),
        &["usd_index".to_string(), "treasury_yield".to_string()]
    );
    assert_eq!(output.forecast.len(), 251 + 30);

    let insight = &output.insight;
    assert_eq!(insight.days_ahead, 30);
    assert_eq!(insight.as_of, start() + Duration::days(299));
    assert_eq!(insight.forecast_date, start() + Duration::days(329));
    assert_eq!(insight.current_price, output.table.last().unwrap().close);
    assert_eq!(
        insight.held_regressors,
        vec!["usd_index".to_string(), "treasury_yield".to_string()]
    );
    assert!(insight.lower_bound <= insight.predicted_price);
    assert!(insight.predicted_price <= insight.upper_bound);

    // floor((251 - 160) / 50) + 1
    let report = output.evaluation.as_ref().unwrap();
    assert_eq!(report.cutoffs().len(), 2);

    let msg = format_alert_message(insight);
    assert!(msg.contains("usd_index, treasury_yield"));
}

#[test]
fn test_target_never_imputed() {
    // Gold closed on weekends of the generated calendar; USD trades every day
    let gold_file = write_series(140, |i| i % 7 == 5 || i % 7 == 6, gold_close);
    let usd_file = write_series(140, |_| false, |i| 100.0 + i as f64);

    let gold = load("gold", gold_file.path());
    let usd = load("usd_index", usd_file.path());

    let aligned = RegressorSeriesBuilder::align(&gold, &[usd]).unwrap();
    assert_eq!(aligned.len(), gold.len());
    for (row, point) in aligned.iter().zip(gold.points()) {
        assert_eq!(row.date, point.date);
        assert_eq!(row.close, point.close);
    }
}

#[test]
fn test_writes_chart_inputs() {
    let gold_file = write_series(120, |_| false, gold_close);
    let gold = load("gold", gold_file.path());

    let output = ForecastPipeline::default().run(&gold, &[], None).unwrap();

    let dir = tempdir().unwrap();
    let history_path = dir.path().join("history.csv");
    let forecast_path = dir.path().join("forecast.csv");
    output.table.write_csv(&history_path).unwrap();
    output.forecast.write_csv(&forecast_path).unwrap();

    let history = fs::read_to_string(&history_path).unwrap();
    let mut lines = history.lines();
    assert_eq!(lines.next().unwrap(), "ds,y,sma_short,sma_long,rsi");
    assert_eq!(lines.count(), output.table.len());

    let forecast = fs::read_to_string(&forecast_path).unwrap();
    let mut lines = forecast.lines();
    assert_eq!(lines.next().unwrap(), "ds,yhat,yhat_lower,yhat_upper");
    assert_eq!(lines.count(), output.table.len() + 30);
}

#[test]
fn test_empty_primary_is_unavailable() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,close").unwrap();
    let gold = load("gold", file.path());
    assert!(gold.is_empty());

    let result = ForecastPipeline::default().run(&gold, &[], None);
    assert!(matches!(result, Err(ForecastError::DataUnavailable(_))));
}

#[test]
fn test_history_shorter_than_warmup_is_unavailable() {
    let gold_file = write_series(40, |_| false, gold_close);
    let gold = load("gold", gold_file.path());

    let result = ForecastPipeline::default().run(&gold, &[], None);
    assert!(matches!(result, Err(ForecastError::DataUnavailable(_))));
}

#[test]
fn test_zero_horizon_rejected() {
    let config = PipelineConfig {
        horizon_days: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        ForecastPipeline::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_out_of_range_sentiment_rejected() {
    let gold_file = write_series(120, |_| false, gold_close);
    let gold = load("gold", gold_file.path());

    let mut sentiment = SentimentSnapshot::from_score(0.4, 5).unwrap();
    sentiment.score = 1.7;

    let result = ForecastPipeline::default().run(&gold, &[], Some(&sentiment));
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));

    sentiment.score = 0.4;
    let output = ForecastPipeline::default()
        .run(&gold, &[], Some(&sentiment))
        .unwrap();
    assert_eq!(output.insight.sentiment, Some(sentiment));
}
