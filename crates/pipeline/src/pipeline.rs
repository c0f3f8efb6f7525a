use crate::error::PipelineError;
use crate::run::{Forecast, ModelOutcome, PredictedVsActual, PredictionPoint, PredictionRun, SeriesSummary};
use analyzer::ComparisonReporter;
use backtester::{ProfitSimulator, SimulationResult, TradingDay};
use configuration::{PredictOptions, Settings};
use core_types::{FeatureWindow, Position};
use crossval::{make_folds, ConfigEvaluation, CrossValidationEngine, CvReport};
use datasource::DataSource;
use ml_features::{labels, window};
use ml_trainer::{ModelConfig, ModelError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Orchestrates one `predict` run: load, window, cross-validate, simulate,
/// compare and forecast.
pub struct Pipeline {
    source: Arc<dyn DataSource>,
    settings: Settings,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(source: Arc<dyn DataSource>, settings: Settings) -> Self {
        Self {
            source,
            settings,
            cancel: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        }
    }

    /// Shares an externally owned cancel flag, e.g. one raised on Ctrl-C.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.source.symbols()
    }

    /// `options` must already be validated.
    pub fn run(&self, options: &PredictOptions) -> Result<PredictionRun, PipelineError> {
        let series = self.source.load(&options.symbol)?;
        let summary = SeriesSummary::from_series(&series);
        let samples = window(&series, options.window)?;

        let configs = ModelConfig::comparison_set(&self.settings.model.mlp, options.compare);
        tracing::info!(
            symbol = %options.symbol,
            samples = samples.len(),
            k = options.kfold,
            window = options.window,
            models = configs.len(),
            "Starting prediction run."
        );

        let report = CrossValidationEngine::new(self.cancel_flag())
            .with_threads(self.settings.parallelism.threads)
            .with_progress(self.show_progress)
            .evaluate(&samples, &configs, options.kfold)?;
        self.check_cancelled()?;

        let simulator = ProfitSimulator::new(self.settings.simulation.initial_balance);
        let outcomes: Vec<ModelOutcome> = report
            .evaluations
            .iter()
            .filter(|e| e.is_usable())
            .map(|evaluation| {
                let simulation = simulator.simulate(&evaluation.label, &trading_days(evaluation, &samples));
                if let Err(e) = &simulation {
                    tracing::warn!(model = %evaluation.label, error = %e, "Simulation diverged; model has no profit rank.");
                }
                ModelOutcome {
                    label: evaluation.label.clone(),
                    simulation,
                }
            })
            .collect();

        let buy_and_hold = self.buy_and_hold(&simulator, &samples, options.kfold)?;

        let completed: Vec<SimulationResult> = outcomes
            .iter()
            .filter_map(|o| o.simulation.as_ref().ok().cloned())
            .collect();
        let comparison = ComparisonReporter::new().compare(&report, &completed, &labels(&samples))?;

        let predicted_vs_actual = primary_model(&report).map(|e| predicted_vs_actual(e, &samples));
        self.check_cancelled()?;
        let (forecast, forecast_failure) = match report.best() {
            Some(best) => match forecast(best, &samples) {
                Ok(forecast) => (Some(forecast), None),
                Err(e) => {
                    tracing::warn!(model = %best.label, error = %e, "Final refit failed; no next-close forecast.");
                    (None, Some(format!("{}: {e}", best.label)))
                }
            },
            None => {
                tracing::warn!(symbol = %options.symbol, "No usable model; skipping the next-close forecast.");
                (None, None)
            }
        };

        Ok(PredictionRun {
            options: options.clone(),
            summary,
            report,
            outcomes,
            buy_and_hold,
            comparison,
            predicted_vs_actual,
            forecast,
            forecast_failure,
        })
    }

    /// Always-long replay over every sample that some fold validates.
    fn buy_and_hold(
        &self,
        simulator: &ProfitSimulator,
        samples: &[FeatureWindow],
        k: usize,
    ) -> Result<Option<SimulationResult>, PipelineError> {
        let folds = make_folds(samples.len(), k)?;
        let first_validated = folds.get(1).map_or(samples.len(), |f| f.range.start);
        let days: Vec<TradingDay> = samples[first_validated..]
            .iter()
            .map(|s| TradingDay {
                prior_close: s.prior_close(),
                predicted_close: s.label,
                actual_close: s.label,
            })
            .collect();

        match simulator.buy_and_hold(&days) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                tracing::warn!(error = %e, "Buy-and-hold baseline diverged.");
                Ok(None)
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

/// One day per out-of-fold prediction, opening at the sample's last feature close.
fn trading_days(evaluation: &ConfigEvaluation, samples: &[FeatureWindow]) -> Vec<TradingDay> {
    evaluation
        .out_of_fold
        .indices
        .iter()
        .zip(&evaluation.out_of_fold.predictions)
        .filter_map(|(&i, &predicted_close)| {
            samples.get(i).map(|s| TradingDay {
                prior_close: s.prior_close(),
                predicted_close,
                actual_close: s.label,
            })
        })
        .collect()
}

fn primary_model(report: &CvReport) -> Option<&ConfigEvaluation> {
    report
        .evaluations
        .iter()
        .find(|e| e.config.is_mlp() && e.is_usable())
        .or_else(|| report.best())
}

fn predicted_vs_actual(evaluation: &ConfigEvaluation, samples: &[FeatureWindow]) -> PredictedVsActual {
    let points = evaluation
        .out_of_fold
        .indices
        .iter()
        .zip(&evaluation.out_of_fold.predictions)
        .filter_map(|(&i, &predicted)| {
            samples.get(i).map(|s| PredictionPoint {
                date: s.anchor_date,
                actual: s.label,
                predicted,
            })
        })
        .collect();
    PredictedVsActual {
        label: evaluation.label.clone(),
        points,
    }
}

/// Refits `best` on all samples and forecasts the close after the last one.
fn forecast(best: &ConfigEvaluation, samples: &[FeatureWindow]) -> Result<Forecast, ModelError> {
    let outcome = best.config.fit(samples)?;

    // The newest window: the last sample's features shifted by its label.
    let (latest, as_of) = match samples.last() {
        Some(last) => {
            let mut features: Vec<f64> = last.features.iter().skip(1).copied().collect();
            features.push(last.label);
            (features, Some(last.anchor_date))
        }
        None => (Vec::new(), None),
    };
    let last_close = latest.last().copied().unwrap_or(f64::NAN);
    let predicted_close = outcome.model.predict(&latest)?;
    let signal = if predicted_close > last_close {
        Position::Long
    } else {
        Position::Flat
    };

    tracing::info!(
        model = %best.label,
        last_close,
        predicted_close,
        signal = ?signal,
        "Next-close forecast."
    );

    Ok(Forecast {
        label: best.label.clone(),
        as_of,
        last_close,
        predicted_close,
        signal,
        converged: outcome.converged,
        model: Some(outcome.model),
    })
}
