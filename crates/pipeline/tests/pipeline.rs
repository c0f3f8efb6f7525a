use chrono::{Days, NaiveDate};
use configuration::{MlpParams, PredictOptions, Settings};
use core_types::{Position, PriceBar, PriceSeries};
use crossval::CvError;
use datasource::{DataError, InMemoryDataSource};
use ml_features::FeatureError;
use pipeline::{Pipeline, PipelineError, PredictionRun};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn series(symbol: &str, closes: impl IntoIterator<Item = f64>) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let bars = closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| PriceBar {
            date: start + Days::new(i as u64),
            close,
            volume: 1_000.0,
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

fn wavy(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(|i| 300.0 + 25.0 * (i as f64 * 0.21).sin() + 0.8 * i as f64)
}

fn fast_mlp() -> MlpParams {
    MlpParams {
        hidden_layer_sizes: vec![8],
        max_iter: 2_000,
        learning_rate_init: 0.01,
        batch_size: 32,
        ..MlpParams::default()
    }
}

fn settings(mlp: MlpParams) -> Settings {
    let mut settings = Settings::default();
    settings.model.mlp = mlp;
    settings.parallelism.threads = Some(2);
    settings
}

fn pipeline(mlp: MlpParams) -> Pipeline {
    let source = InMemoryDataSource::new()
        .with_series(series("BTC", wavy(90)))
        .with_series(series("ETH", (0..60).map(|i| 100.0 + i as f64)));
    Pipeline::new(Arc::new(source), settings(mlp))
}

fn options(symbol: &str, kfold: usize, window: usize, compare: bool) -> PredictOptions {
    PredictOptions {
        symbol: symbol.to_string(),
        kfold,
        window,
        compare,
    }
}

fn balances(run: &PredictionRun) -> Vec<(String, Decimal)> {
    run.completed_simulations()
        .filter(|s| s.label != "MLP")
        .map(|s| (s.label.clone(), s.final_balance))
        .collect()
}

#[test]
fn compare_run_produces_every_artifact() {
    let run = pipeline(fast_mlp()).run(&options("BTC", 4, 3, true)).unwrap();

    assert_eq!(run.summary.observations, 90);
    assert_eq!(run.summary.first_date, NaiveDate::from_ymd_opt(2022, 1, 1));
    assert_eq!(run.report.samples, 87);
    assert_eq!(run.report.evaluations.len(), 11);
    assert!(run.report.get("Linear").unwrap().is_usable());

    let usable = run.report.ranked().len();
    assert_eq!(run.outcomes.len(), usable);
    assert_eq!(run.comparison.records.len(), usable);
    assert_eq!(run.comparison.unusable.len(), 11 - usable);

    // fold 0 (22 samples) is never validated
    let hold = run.buy_and_hold.as_ref().unwrap();
    assert_eq!(hold.equity_curve.len(), 87 - 22 + 1);
    for sim in run.completed_simulations() {
        assert_eq!(sim.equity_curve.len(), hold.equity_curve.len());
    }

    let pva = run.predicted_vs_actual.as_ref().unwrap();
    assert_eq!(pva.points.len(), 65);
    assert_eq!(pva.points[0].date, NaiveDate::from_ymd_opt(2022, 1, 26).unwrap());

    let forecast = run.forecast.as_ref().unwrap();
    assert_eq!(forecast.label, run.report.best().unwrap().label);
    assert_eq!(forecast.as_of, run.summary.last_date);
    assert!(forecast.predicted_close.is_finite());
    assert!(forecast.model.is_some());
}

#[test]
fn mlp_only_run_evaluates_a_single_model() {
    let run = pipeline(fast_mlp()).run(&options("BTC", 3, 5, false)).unwrap();
    assert_eq!(run.report.evaluations.len(), 1);
    assert_eq!(run.report.evaluations[0].label, "MLP");
}

#[test]
fn rising_line_is_forecast_exactly_by_the_linear_model() {
    let run = pipeline(fast_mlp()).run(&options("ETH", 3, 2, true)).unwrap();

    let linear = run.report.get("Linear").unwrap();
    assert!(linear.rmse.mean < 1e-6, "rmse {}", linear.rmse.mean);

    // always long on a rising line, so the model matches the baseline
    let sim = run.completed_simulations().find(|s| s.label == "Linear").unwrap();
    let hold = run.buy_and_hold.as_ref().unwrap();
    assert_eq!(sim.final_balance, hold.final_balance);
    assert_eq!(sim.days_long, sim.equity_curve.len() - 1);

    let forecast = run.forecast.as_ref().unwrap();
    assert!((forecast.predicted_close - 160.0).abs() < 1e-3);
    assert_eq!(forecast.last_close, 159.0);
    assert_eq!(forecast.signal, Position::Long);
}

#[test]
fn repeated_runs_are_identical() {
    let pipeline = pipeline(fast_mlp());
    let opts = options("BTC", 4, 3, true);
    let first = pipeline.run(&opts).unwrap();
    let second = pipeline.run(&opts).unwrap();

    let summary = |run: &PredictionRun| -> Vec<(String, f64, f64, Option<usize>)> {
        run.comparison
            .records
            .iter()
            .map(|r| (r.label.clone(), r.mean_rmse, r.rmse_std, r.profit_rank))
            .collect()
    };
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(
        first.completed_simulations().collect::<Vec<_>>(),
        second.completed_simulations().collect::<Vec<_>>()
    );
    let forecast = |run: &PredictionRun| run.forecast.as_ref().map(|f| f.predicted_close);
    assert_eq!(forecast(&first), forecast(&second));
}

#[test]
fn unusable_mlp_leaves_the_other_models_untouched() {
    let opts = options("BTC", 4, 3, true);
    let healthy = pipeline(fast_mlp()).run(&opts).unwrap();
    let broken = pipeline(MlpParams {
        max_iter: 1,
        ..fast_mlp()
    })
    .run(&opts)
    .unwrap();

    let mlp = broken.report.get("MLP").unwrap();
    assert!(!mlp.is_usable());
    assert!(broken.comparison.get("MLP").is_none());
    assert!(broken.comparison.unusable.contains(&"MLP".to_string()));
    assert!(broken.outcomes.iter().all(|o| o.label != "MLP"));
    // the best alternative stands in for the unusable MLP
    assert_eq!(
        broken.predicted_vs_actual.as_ref().map(|p| p.label.as_str()),
        broken.report.best().map(|e| e.label.as_str())
    );

    let others = |run: &PredictionRun| -> Vec<(String, f64)> {
        run.report
            .ranked()
            .iter()
            .filter(|e| !e.config.is_mlp())
            .map(|e| (e.label.clone(), e.rmse.mean))
            .collect()
    };
    assert_eq!(others(&healthy), others(&broken));
    assert_eq!(balances(&healthy), balances(&broken));
}

#[test]
fn a_missing_close_degrades_the_run_instead_of_aborting_it() {
    let mut closes: Vec<f64> = wavy(90).collect();
    closes[80] = f64::NAN;
    let source = InMemoryDataSource::new()
        .with_series(series("BTC", wavy(90)))
        .with_series(series("SOL", closes));
    let pipeline = Pipeline::new(Arc::new(source), settings(fast_mlp()));

    let clean = pipeline.run(&options("BTC", 4, 3, true)).unwrap();
    let gapped = pipeline.run(&options("SOL", 4, 3, true)).unwrap();

    // samples 77..=80 touch the gap and all sit in the last fold
    let linear = gapped.report.get("Linear").unwrap();
    assert!(linear.is_usable());
    assert_eq!(linear.failed_folds, 1);
    assert!(!linear.folds[2].status.is_scored());
    let scores = |run: &PredictionRun| -> Vec<Option<f64>> {
        run.report.get("Linear").unwrap().folds[..2]
            .iter()
            .map(|f| f.metrics.map(|m| m.rmse))
            .collect()
    };
    assert_eq!(scores(&clean), scores(&gapped));

    // the replays only cover scored folds, the baseline covers the gap
    assert!(gapped.outcomes.iter().all(|o| o.simulation.is_ok()));
    assert!(gapped.buy_and_hold.is_none());
    assert!(!gapped.comparison.records.is_empty());

    // refitting on every sample hits the gap
    assert!(gapped.forecast.is_none());
    let failure = gapped.forecast_failure.as_deref().unwrap();
    assert!(failure.starts_with(&gapped.report.best().unwrap().label));
    assert!(clean.forecast.is_some());
    assert!(clean.forecast_failure.is_none());
}

#[test]
fn unknown_symbol_is_reported() {
    let err = pipeline(fast_mlp()).run(&options("DOGE", 4, 3, false)).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::UnknownSymbol(s)) if s == "DOGE"));
}

#[test]
fn window_must_be_shorter_than_the_series() {
    let err = pipeline(fast_mlp()).run(&options("ETH", 3, 60, false)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Features(FeatureError::InsufficientData { window: 60, len: 60 })
    ));
}

#[test]
fn fold_count_cannot_exceed_the_samples() {
    // 60 closes with a window of 55 leave 5 samples
    let err = pipeline(fast_mlp()).run(&options("ETH", 6, 55, false)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::CrossValidation(CvError::InvalidFoldCount { k: 6, samples: 5 })
    ));
}

#[test]
fn a_raised_cancel_flag_stops_the_run() {
    let cancel = Arc::new(AtomicBool::new(false));
    let pipeline = pipeline(fast_mlp()).with_cancel_flag(Arc::clone(&cancel));
    cancel.store(true, Ordering::SeqCst);

    let err = pipeline.run(&options("BTC", 4, 3, true)).unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
}
