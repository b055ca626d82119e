use assert_approx_eq::assert_approx_eq;
use chrono::{Duration, NaiveDate};
use forecast_engine::config::{EvaluationConfig, Frequency, ModelConfig};
use forecast_engine::models::ModelState;
use forecast_engine::{FeatureTable, ForecastError, ForecastModel, PriceFeatureRow};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()
}

// Daily rows with no regressors
fn linear_table(days: i64) -> FeatureTable {
    let rows = (0..days)
        .map(|i| row(i, 1000.0 + 2.0 * i as f64, vec![]))
        .collect();
    FeatureTable::new(vec![], rows).unwrap()
}

fn row(i: i64, close: f64, regressors: Vec<f64>) -> PriceFeatureRow {
    PriceFeatureRow {
        date: start() + Duration::days(i),
        close,
        sma_short: close,
        sma_long: close,
        rsi: 50.0,
        regressors,
    }
}

fn regressor_table(days: i64) -> FeatureTable {
    let rows = (0..days)
        .map(|i| {
            let usd = 100.0 + ((i * 37) % 11) as f64;
            let yld = 4.0 + 0.01 * i as f64;
            row(i, 1500.0 + 1.5 * i as f64 - 3.0 * usd, vec![usd, yld])
        })
        .collect();
    FeatureTable::new(vec!["usd_index".into(), "treasury_yield".into()], rows).unwrap()
}

#[test]
fn test_linear_trend_extrapolation() {
    let table = linear_table(200);
    let mut model = ForecastModel::new(ModelConfig::default()).unwrap();
    model.fit(&table).unwrap();

    let forecast = model.predict(&table, 30).unwrap();
    assert_eq!(forecast.len(), 230);
    assert_eq!(forecast.history().len(), 200);
    assert_eq!(forecast.horizon().len(), 30);

    let last = forecast.final_point().unwrap();
    assert_eq!(last.date, start() + Duration::days(229));

    let expected = 1000.0 + 2.0 * 229.0;
    assert!(
        (last.yhat - expected).abs() < 0.01 * expected,
        "forecast {} too far from trend {}",
        last.yhat,
        expected
    );
    assert!(
        last.yhat_lower <= expected && expected <= last.yhat_upper,
        "trend {} outside band [{}, {}]",
        expected,
        last.yhat_lower,
        last.yhat_upper
    );
}

#[test]
fn test_long_history_extrapolation_with_yearly_component() {
    let table = linear_table(800);
    let mut model = ForecastModel::new(ModelConfig::default()).unwrap();
    model.fit(&table).unwrap();

    let last = *model.predict(&table, 30).unwrap().final_point().unwrap();
    let expected = 1000.0 + 2.0 * 829.0;
    assert!((last.yhat - expected).abs() < 0.01 * expected);
    assert!(last.yhat_lower <= expected && expected <= last.yhat_upper);
}

#[test]
fn test_predict_is_idempotent() {
    let table = regressor_table(300);
    let config = ModelConfig::default().with_regressors(["usd_index", "treasury_yield"]);
    let mut model = ForecastModel::new(config).unwrap();
    model.fit(&table).unwrap();

    let first = model.predict(&table, 30).unwrap();
    let second = model.predict(&table, 30).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bands_contain_point_forecast() {
    let table = regressor_table(300);
    let config = ModelConfig::default().with_regressors(["usd_index", "treasury_yield"]);
    let mut model = ForecastModel::new(config).unwrap();
    model.fit(&table).unwrap();

    let forecast = model.predict(&table, 45).unwrap();
    for point in forecast.points() {
        assert!(point.yhat_lower <= point.yhat);
        assert!(point.yhat <= point.yhat_upper);
    }
    assert_eq!(
        forecast.held_regressors(),
        &["usd_index".to_string(), "treasury_yield".to_string()]
    );
}

#[test]
fn test_frame_reuses_history_and_holds_last_values() {
    let table = regressor_table(200);
    let config = ModelConfig::default().with_regressors(["usd_index", "treasury_yield"]);
    let mut model = ForecastModel::new(config).unwrap();
    model.fit(&table).unwrap();

    let forecast = model.predict(&table, 20).unwrap();
    let frame = forecast.frame();
    assert_eq!(frame.history_len(), 200);
    assert_eq!(frame.horizon_len(), 20);

    for (frame_row, row) in frame.rows().iter().zip(table.rows()) {
        assert_eq!(frame_row.date, row.date);
        assert_eq!(frame_row.regressors, row.regressors);
    }
    let last = &table.last().unwrap().regressors;
    assert!(frame.rows()[200..].iter().all(|r| &r.regressors == last));
}

#[test]
fn test_regressors_held_constant_over_horizon() {
    let table = regressor_table(300);
    let config = ModelConfig::default().with_regressors(["usd_index"]);
    let mut model = ForecastModel::new(config).unwrap();
    model.fit(&table).unwrap();

    // Append a day on which the model regressor repeats its last value
    let mut rows = table.rows().to_vec();
    let mut extra = rows.last().unwrap().clone();
    extra.date += Duration::days(1);
    extra.regressors[1] = 999.0;
    rows.push(extra);
    let extended = FeatureTable::new(table.regressor_names().to_vec(), rows).unwrap();

    let base = model.predict(&table, 10).unwrap();
    let shifted = model.predict(&extended, 9).unwrap();
    // treasury_yield is not a model regressor
    for (a, b) in base.horizon()[1..].iter().zip(shifted.horizon()) {
        assert_eq!(a.date, b.date);
        assert_approx_eq!(a.yhat, b.yhat, 1e-9);
    }
    assert_eq!(shifted.held_regressors(), &["usd_index".to_string()]);
}

#[test]
fn test_noisy_history_band_coverage() {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 5.0).unwrap();
    let rows = (0..400)
        .map(|i| {
            let weekly = 3.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin();
            row(i, 800.0 + 0.8 * i as f64 + weekly + noise.sample(&mut rng), vec![])
        })
        .collect();
    let table = FeatureTable::new(vec![], rows).unwrap();

    let mut model = ForecastModel::new(ModelConfig::default()).unwrap();
    model.fit(&table).unwrap();
    let forecast = model.predict(&table, 0).unwrap();

    let inside = forecast
        .history()
        .iter()
        .zip(table.rows())
        .filter(|(p, r)| r.close >= p.yhat_lower && r.close <= p.yhat_upper)
        .count();
    assert!(inside as f64 / 400.0 > 0.85);
}

#[test]
fn test_business_frequency_skips_weekends() {
    let table = linear_table(120);
    let mut model = ForecastModel::new(ModelConfig::default())
        .unwrap()
        .with_frequency(Frequency::Business);
    model.fit(&table).unwrap();

    let forecast = model.predict(&table, 10).unwrap();
    assert_eq!(forecast.horizon().len(), 10);
    assert!(forecast
        .horizon()
        .iter()
        .all(|p| !matches!(p.date.format("%a").to_string().as_str(), "Sat" | "Sun")));
}

#[test]
fn test_state_transitions() {
    let table = linear_table(100);
    let mut model = ForecastModel::new(ModelConfig::default()).unwrap();

    assert!(matches!(model.state(), ModelState::Unfitted));
    assert!(matches!(
        model.predict(&table, 5),
        Err(ForecastError::InvalidModelState(_))
    ));
    assert!(matches!(
        model.evaluate(&EvaluationConfig::new(50, 10, 5).unwrap()),
        Err(ForecastError::InvalidModelState(_))
    ));

    model.fit(&table).unwrap();
    assert!(model.is_fitted());
    assert!(matches!(
        model.fit(&table),
        Err(ForecastError::InvalidModelState(_))
    ));
}

#[test]
fn test_fit_empty_table() {
    let mut model = ForecastModel::new(ModelConfig::default()).unwrap();
    assert!(matches!(
        model.fit(&FeatureTable::empty(vec![])),
        Err(ForecastError::DataUnavailable(_))
    ));
    assert!(!model.is_fitted());
}
