use crate::error::CvError;
use crate::folds::{make_folds, Fold};
use crate::report::{ConfigEvaluation, CvReport, FoldResult, FoldStatus};
use analytics::RegressionMetrics;
use core_types::FeatureWindow;
use indicatif::{ProgressBar, ProgressStyle};
use ml_features::labels;
use ml_trainer::ModelConfig;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Blocked, forward-only K-fold evaluation of a set of model configurations.
///
/// Fold `j` is validated by a model trained on every sample before it. Fold 0
/// has no history and is skipped. All `(config, fold)` pairs train in
/// parallel; results are reduced in `(config, fold)` order.
pub struct CrossValidationEngine {
    cancel: Arc<AtomicBool>,
    threads: Option<usize>,
    show_progress: bool,
}

impl CrossValidationEngine {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self {
            cancel,
            threads: None,
            show_progress: true,
        }
    }

    /// Caps the worker count; `None` uses one per core.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn evaluate(
        &self,
        samples: &[FeatureWindow],
        configs: &[ModelConfig],
        k: usize,
    ) -> Result<CvReport, CvError> {
        let folds = make_folds(samples.len(), k)?;
        let tasks: Vec<(usize, &Fold)> = (0..configs.len())
            .flat_map(|c| folds.iter().skip(1).map(move |fold| (c, fold)))
            .collect();

        tracing::debug!(
            samples = samples.len(),
            k,
            configs = configs.len(),
            tasks = tasks.len(),
            "Starting cross-validation."
        );

        let progress_bar = self.progress_bar(tasks.len())?;
        let run = || {
            tasks
                .par_iter()
                .map(|&(c, fold)| {
                    if self.cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    let result = run_fold(&configs[c], samples, fold);
                    progress_bar.inc(1);
                    Some(result)
                })
                .collect::<Vec<Option<FoldResult>>>()
        };
        let results = match self.thread_pool()? {
            Some(pool) => pool.install(run),
            None => run(),
        };
        progress_bar.finish_and_clear();

        if self.cancel.load(Ordering::Relaxed) {
            return Err(CvError::Cancelled);
        }
        let results: Vec<FoldResult> = results.into_iter().collect::<Option<_>>().ok_or(CvError::Cancelled)?;
        let mut results = results.into_iter();

        let per_config = folds.len() - 1;
        let evaluations = configs
            .iter()
            .map(|config| {
                let config_folds: Vec<FoldResult> = results.by_ref().take(per_config).collect();
                let evaluation = ConfigEvaluation::from_folds(config.clone(), config_folds);
                if !evaluation.is_usable() {
                    tracing::warn!(
                        model = %evaluation.label,
                        not_converged = evaluation.not_converged_folds,
                        failed = evaluation.failed_folds,
                        "Model unusable: no fold converged; excluded from ranking."
                    );
                }
                evaluation
            })
            .collect();

        Ok(CvReport {
            k,
            samples: samples.len(),
            evaluations,
        })
    }

    fn thread_pool(&self) -> Result<Option<rayon::ThreadPool>, CvError> {
        self.threads
            .map(|n| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| CvError::ThreadPool(e.to_string()))
            })
            .transpose()
    }

    fn progress_bar(&self, len: usize) -> Result<ProgressBar, CvError> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let progress_bar = ProgressBar::new(len as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} folds ({eta})")?
                .progress_chars("=>-"),
        );
        Ok(progress_bar)
    }
}

/// Trains on everything before `fold` and scores the fold.
fn run_fold(config: &ModelConfig, samples: &[FeatureWindow], fold: &Fold) -> FoldResult {
    let label = config.label();
    let mut result = FoldResult {
        fold_id: fold.id,
        label: label.clone(),
        status: FoldStatus::Failed(String::new()),
        range: fold.range.clone(),
        iterations: 0,
        metrics: None,
        predictions: Vec::new(),
    };

    let train = &samples[fold.training_range()];
    let valid = &samples[fold.range.clone()];

    let outcome = match config.fit(train) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(model = %label, fold = fold.id, error = %e, "Fold training failed.");
            result.status = FoldStatus::Failed(e.to_string());
            return result;
        }
    };
    result.iterations = outcome.iterations;

    let predictions = match outcome.model.predict_batch(valid) {
        Ok(p) if p.iter().all(|v| v.is_finite()) => p,
        Ok(_) => {
            tracing::warn!(model = %label, fold = fold.id, "Fold produced non-finite predictions.");
            result.status = FoldStatus::Failed("non-finite predictions".to_string());
            return result;
        }
        Err(e) => {
            result.status = FoldStatus::Failed(e.to_string());
            return result;
        }
    };

    let metrics = match RegressionMetrics::compute(&labels(valid), &predictions) {
        Ok(m) => m,
        Err(e) => {
            result.status = FoldStatus::Failed(e.to_string());
            return result;
        }
    };

    result.status = if outcome.converged {
        FoldStatus::Converged
    } else {
        tracing::warn!(model = %label, fold = fold.id, "Fold scored without convergence.");
        FoldStatus::NotConverged
    };
    tracing::info!(
        model = %label,
        fold = fold.id,
        train = train.len(),
        valid = valid.len(),
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        "Fold evaluated."
    );

    result.metrics = Some(metrics);
    result.predictions = predictions;
    result
}
