use crate::error::AnalyzerError;
use analytics::{error_std, linear_fit, pearson, LinearFit};
use backtester::SimulationResult;
use crossval::{ConfigEvaluation, CvReport};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Out-of-fold prediction quality beyond the fold metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub correlation: Option<f64>,
    pub error_std: Option<f64>,
    /// Only reported for non-polynomial models.
    pub linear_fit: Option<LinearFit>,
}

/// One usable model with its place in both rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub label: String,
    pub error_rank: usize,
    /// `None` when the model's simulation diverged.
    pub profit_rank: Option<usize>,
    pub final_balance: Option<Decimal>,
    pub mean_rmse: f64,
    pub rmse_std: f64,
    pub mean_mae: f64,
    pub mean_r2: f64,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// In error-rank order.
    pub records: Vec<ComparisonRecord>,
    /// Labels of configurations left out because they never converged.
    pub unusable: Vec<String>,
    /// MLP error std minus that of the most accurate non-MLP model.
    pub mlp_error_std_gap: Option<f64>,
}

impl Comparison {
    pub fn by_profit(&self) -> Vec<&ComparisonRecord> {
        let mut ranked: Vec<&ComparisonRecord> = self.records.iter().filter(|r| r.profit_rank.is_some()).collect();
        ranked.sort_by_key(|r| r.profit_rank);
        ranked
    }

    pub fn get(&self, label: &str) -> Option<&ComparisonRecord> {
        self.records.iter().find(|r| r.label == label)
    }
}

/// Joins the error ranking of a cross-validation report with the profit
/// ranking of the simulations.
#[derive(Debug, Default)]
pub struct ComparisonReporter;

impl ComparisonReporter {
    pub fn new() -> Self {
        Self
    }

    /// `labels` holds the label of every sample, indexed like the out-of-fold
    /// indices. `simulations` holds only the simulations that completed.
    pub fn compare(
        &self,
        report: &CvReport,
        simulations: &[SimulationResult],
        labels: &[f64],
    ) -> Result<Comparison, AnalyzerError> {
        let profit_ranks = profit_ranking(simulations);

        let ranked = report.ranked();
        let mut records = Vec::with_capacity(ranked.len());
        for (i, evaluation) in ranked.iter().enumerate() {
            let simulation = simulations.iter().find(|s| s.label == evaluation.label);
            records.push(ComparisonRecord {
                label: evaluation.label.clone(),
                error_rank: i + 1,
                profit_rank: profit_ranks
                    .iter()
                    .position(|label| *label == evaluation.label)
                    .map(|p| p + 1),
                final_balance: simulation.map(|s| s.final_balance),
                mean_rmse: evaluation.rmse.mean,
                rmse_std: evaluation.rmse.std,
                mean_mae: evaluation.mae.mean,
                mean_r2: evaluation.r2.mean,
                diagnostics: diagnostics(evaluation, labels)?,
            });
        }

        let mlp_error_std_gap = mlp_gap(&ranked, &records);
        let unusable = report.unusable().map(|e| e.label.clone()).collect();

        tracing::debug!(records = records.len(), "Built model comparison.");
        Ok(Comparison {
            records,
            unusable,
            mlp_error_std_gap,
        })
    }
}

/// Labels by final balance, highest first; equal balances sort by label.
fn profit_ranking(simulations: &[SimulationResult]) -> Vec<&str> {
    let mut ordered: Vec<&SimulationResult> = simulations.iter().collect();
    ordered.sort_by(|a, b| match b.final_balance.cmp(&a.final_balance) {
        Ordering::Equal => a.label.cmp(&b.label),
        other => other,
    });
    ordered.into_iter().map(|s| s.label.as_str()).collect()
}

fn diagnostics(evaluation: &ConfigEvaluation, labels: &[f64]) -> Result<Diagnostics, AnalyzerError> {
    let actual = evaluation
        .out_of_fold
        .indices
        .iter()
        .map(|&index| {
            labels.get(index).copied().ok_or_else(|| AnalyzerError::MissingSample {
                label: evaluation.label.clone(),
                index,
                available: labels.len(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    let predicted = &evaluation.out_of_fold.predictions;

    Ok(Diagnostics {
        correlation: pearson(&actual, predicted),
        error_std: error_std(&actual, predicted),
        linear_fit: if evaluation.config.polynomial_degree().is_some() {
            None
        } else {
            linear_fit(&actual, predicted)
        },
    })
}

fn mlp_gap(ranked: &[&ConfigEvaluation], records: &[ComparisonRecord]) -> Option<f64> {
    let error_std_of = |pick: &dyn Fn(&ConfigEvaluation) -> bool| {
        ranked
            .iter()
            .zip(records)
            .find(|(e, _)| pick(**e))
            .and_then(|(_, r)| r.diagnostics.error_std)
    };
    let mlp = error_std_of(&|e| e.config.is_mlp())?;
    let alternative = error_std_of(&|e| !e.config.is_mlp())?;
    Some(mlp - alternative)
}
