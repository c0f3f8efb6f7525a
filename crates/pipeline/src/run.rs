use analyzer::Comparison;
use backtester::{SimulationError, SimulationResult};
use chrono::NaiveDate;
use configuration::PredictOptions;
use core_types::{Position, PriceSeries};
use crossval::CvReport;
use ml_trainer::TrainedModel;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of the loaded closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub symbol: String,
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesSummary {
    pub fn from_series(series: &PriceSeries) -> Self {
        let stats = analytics::describe(&series.closes());
        Self {
            symbol: series.symbol().to_string(),
            observations: series.len(),
            first_date: series.first_date(),
            last_date: series.last_date(),
            mean: stats.map_or(f64::NAN, |d| d.mean),
            std: stats.map_or(f64::NAN, |d| d.std),
            min: stats.map_or(f64::NAN, |d| d.min),
            max: stats.map_or(f64::NAN, |d| d.max),
        }
    }
}

/// The profit replay of one usable model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub label: String,
    pub simulation: Result<SimulationResult, SimulationError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

/// Out-of-fold forecasts of one model against the realised closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedVsActual {
    pub label: String,
    pub points: Vec<PredictionPoint>,
}

/// The selected model refitted on every sample and applied to the latest window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub label: String,
    pub as_of: Option<NaiveDate>,
    pub last_close: f64,
    pub predicted_close: f64,
    pub signal: Position,
    pub converged: bool,
    #[serde(skip)]
    pub model: Option<TrainedModel>,
}

/// Everything one `predict` invocation produces.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub options: PredictOptions,
    pub summary: SeriesSummary,
    pub report: CvReport,
    /// Usable models only, in configuration order.
    pub outcomes: Vec<ModelOutcome>,
    /// Always-long baseline over the validated days; not ranked.
    pub buy_and_hold: Option<SimulationResult>,
    pub comparison: Comparison,
    /// The MLP, or the best model when the MLP is unusable.
    pub predicted_vs_actual: Option<PredictedVsActual>,
    pub forecast: Option<Forecast>,
    /// Why the best model could not be refitted, when it could not.
    pub forecast_failure: Option<String>,
}

impl PredictionRun {
    pub fn completed_simulations(&self) -> impl Iterator<Item = &SimulationResult> {
        self.outcomes.iter().filter_map(|o| o.simulation.as_ref().ok())
    }
}
