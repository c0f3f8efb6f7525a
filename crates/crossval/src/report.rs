use analytics::{MetricAccumulator, RegressionMetrics};
use ml_trainer::ModelConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FoldStatus {
    Converged,
    /// Scored, but training hit its iteration cap.
    NotConverged,
    /// Not scored.
    Failed(String),
}

impl FoldStatus {
    pub fn is_scored(&self) -> bool {
        !matches!(self, FoldStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold_id: usize,
    pub label: String,
    pub status: FoldStatus,
    /// Validation sample indices.
    pub range: Range<usize>,
    pub iterations: usize,
    pub metrics: Option<RegressionMetrics>,
    /// One prediction per validation sample; empty when the fold failed.
    pub predictions: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    Usable,
    /// No fold converged; excluded from ranking.
    Unusable,
}

/// Mean and population standard deviation of one metric across scored folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
    pub folds: usize,
}

impl From<&MetricAccumulator> for MetricSummary {
    fn from(acc: &MetricAccumulator) -> Self {
        Self {
            mean: acc.mean().unwrap_or(f64::NAN),
            std: acc.std().unwrap_or(f64::NAN),
            folds: acc.count(),
        }
    }
}

/// Per-metric accumulators; folds merge into them in any grouping.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FoldScores {
    rmse: MetricAccumulator,
    mae: MetricAccumulator,
    r2: MetricAccumulator,
}

impl FoldScores {
    pub(crate) fn from_metrics(metrics: &RegressionMetrics) -> Self {
        let mut scores = Self::default();
        scores.rmse.push(metrics.rmse);
        scores.mae.push(metrics.mae);
        if metrics.r2.is_finite() {
            scores.r2.push(metrics.r2);
        }
        scores
    }

    pub(crate) fn merge(mut self, other: &Self) -> Self {
        self.rmse.merge(&other.rmse);
        self.mae.merge(&other.mae);
        self.r2.merge(&other.r2);
        self
    }
}

/// Sample indices and predictions of every scored fold, in time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutOfFold {
    pub indices: Vec<usize>,
    pub predictions: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEvaluation {
    pub config: ModelConfig,
    pub label: String,
    pub status: ModelStatus,
    pub rmse: MetricSummary,
    pub mae: MetricSummary,
    pub r2: MetricSummary,
    pub converged_folds: usize,
    pub not_converged_folds: usize,
    pub failed_folds: usize,
    pub folds: Vec<FoldResult>,
    pub out_of_fold: OutOfFold,
}

impl ConfigEvaluation {
    /// Folds must arrive in fold order.
    pub fn from_folds(config: ModelConfig, folds: Vec<FoldResult>) -> Self {
        let count = |want: fn(&FoldStatus) -> bool| folds.iter().filter(|f| want(&f.status)).count();
        let converged_folds = count(|s| matches!(s, FoldStatus::Converged));
        let not_converged_folds = count(|s| matches!(s, FoldStatus::NotConverged));
        let failed_folds = count(|s| matches!(s, FoldStatus::Failed(_)));

        let scores = folds
            .iter()
            .filter(|f| f.status.is_scored())
            .filter_map(|f| f.metrics.as_ref())
            .map(FoldScores::from_metrics)
            .fold(FoldScores::default(), |acc, s| acc.merge(&s));

        let mut out_of_fold = OutOfFold::default();
        for fold in folds.iter().filter(|f| f.status.is_scored()) {
            out_of_fold.indices.extend(fold.range.clone());
            out_of_fold.predictions.extend_from_slice(&fold.predictions);
        }

        let status = if converged_folds > 0 {
            ModelStatus::Usable
        } else {
            ModelStatus::Unusable
        };

        Self {
            label: config.label(),
            config,
            status,
            rmse: MetricSummary::from(&scores.rmse),
            mae: MetricSummary::from(&scores.mae),
            r2: MetricSummary::from(&scores.r2),
            converged_folds,
            not_converged_folds,
            failed_folds,
            folds,
            out_of_fold,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.status == ModelStatus::Usable
    }
}

/// Error ordering: lower mean RMSE, then the simpler model, then lower RMSE spread.
pub fn error_order(a: &ConfigEvaluation, b: &ConfigEvaluation) -> Ordering {
    a.rmse
        .mean
        .total_cmp(&b.rmse.mean)
        .then_with(|| a.config.complexity().cmp(&b.config.complexity()))
        .then_with(|| a.rmse.std.total_cmp(&b.rmse.std))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvReport {
    pub k: usize,
    pub samples: usize,
    /// In the order the configurations were given.
    pub evaluations: Vec<ConfigEvaluation>,
}

impl CvReport {
    /// Usable configurations, best first.
    pub fn ranked(&self) -> Vec<&ConfigEvaluation> {
        let mut usable: Vec<&ConfigEvaluation> = self.evaluations.iter().filter(|e| e.is_usable()).collect();
        usable.sort_by(|a, b| error_order(a, b));
        usable
    }

    pub fn best(&self) -> Option<&ConfigEvaluation> {
        self.ranked().into_iter().next()
    }

    pub fn get(&self, label: &str) -> Option<&ConfigEvaluation> {
        self.evaluations.iter().find(|e| e.label == label)
    }

    pub fn unusable(&self) -> impl Iterator<Item = &ConfigEvaluation> {
        self.evaluations.iter().filter(|e| !e.is_usable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fold(id: usize, status: FoldStatus, rmse: f64) -> FoldResult {
        let scored = status.is_scored();
        FoldResult {
            fold_id: id,
            label: "Linear".to_string(),
            status,
            range: id * 2..id * 2 + 2,
            iterations: 1,
            metrics: scored.then_some(RegressionMetrics { rmse, mae: rmse / 2.0, r2: 0.5 }),
            predictions: if scored { vec![1.0, 2.0] } else { vec![] },
        }
    }

    #[test]
    fn aggregates_only_scored_folds() {
        let eval = ConfigEvaluation::from_folds(
            ModelConfig::Linear,
            vec![
                fold(1, FoldStatus::Converged, 2.0),
                fold(2, FoldStatus::Failed("boom".to_string()), 100.0),
                fold(3, FoldStatus::NotConverged, 4.0),
            ],
        );

        assert!(eval.is_usable());
        assert_eq!((eval.converged_folds, eval.not_converged_folds, eval.failed_folds), (1, 1, 1));
        assert_abs_diff_eq!(eval.rmse.mean, 3.0);
        assert_abs_diff_eq!(eval.rmse.std, 1.0);
        assert_eq!(eval.rmse.folds, 2);
        assert_eq!(eval.out_of_fold.indices, vec![2, 3, 6, 7]);
    }

    #[test]
    fn fold_results_carry_only_scores_and_predictions() {
        let original = fold(2, FoldStatus::NotConverged, 1.5);
        let json = serde_json::to_value(&original).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["fold_id", "iterations", "label", "metrics", "predictions", "range", "status"]
        );

        let restored: FoldResult = serde_json::from_value(json).unwrap();
        assert_eq!(restored.status, FoldStatus::NotConverged);
        assert_eq!(restored.range, 4..6);
        assert_eq!(restored.predictions, original.predictions);
    }

    #[test]
    fn no_converged_fold_makes_a_config_unusable() {
        let eval = ConfigEvaluation::from_folds(
            ModelConfig::Linear,
            vec![
                fold(1, FoldStatus::NotConverged, 1.0),
                fold(2, FoldStatus::Failed("x".to_string()), 1.0),
            ],
        );
        assert_eq!(eval.status, ModelStatus::Unusable);
    }

    #[test]
    fn ties_break_on_complexity_then_spread() {
        let eval = |config: ModelConfig, rmse: f64, std: f64| {
            let mut e = ConfigEvaluation::from_folds(config, vec![fold(1, FoldStatus::Converged, rmse)]);
            e.rmse.std = std;
            e
        };
        let report = CvReport {
            k: 3,
            samples: 6,
            evaluations: vec![
                eval(ModelConfig::Polynomial { degree: 3 }, 1.0, 0.0),
                eval(ModelConfig::Polynomial { degree: 2 }, 1.0, 0.5),
                eval(ModelConfig::Linear, 2.0, 0.0),
                eval(ModelConfig::Polynomial { degree: 2 }, 1.0, 0.1),
            ],
        };
        let order: Vec<(String, f64)> = report.ranked().iter().map(|e| (e.label.clone(), e.rmse.std)).collect();
        assert_eq!(
            order,
            vec![
                ("Poly_2".to_string(), 0.1),
                ("Poly_2".to_string(), 0.5),
                ("Poly_3".to_string(), 0.0),
                ("Linear".to_string(), 0.0),
            ]
        );
        assert_eq!(report.best().map(|e| e.label.as_str()), Some("Poly_2"));
    }
}
