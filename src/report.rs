use analyzer::ComparisonRecord;
use anyhow::Context;
use backtester::SimulationResult;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use crossval::CvReport;
use ml_features::feature_names;
use pipeline::{Forecast, PredictionRun, SeriesSummary};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

// ==============================================================================
// Terminal Output
// ==============================================================================

pub fn print_run(run: &PredictionRun) {
    print_summary(&run.summary);
    println!("\n{}", cv_table(&run.report));
    if run.options.compare {
        println!("\n{}", comparison_table(&run.comparison.records));
    }
    if !run.comparison.unusable.is_empty() {
        println!(
            "Unusable (no fold converged): {}",
            run.comparison.unusable.join(", ")
        );
    }
    if let Some(gap) = run.comparison.mlp_error_std_gap {
        println!("MLP error std minus best alternative: {gap:+.4}");
    }
    for outcome in &run.outcomes {
        if let Err(e) = &outcome.simulation {
            println!("{}: simulation diverged ({e})", outcome.label);
        }
    }
    if let Some(hold) = &run.buy_and_hold {
        println!(
            "\nBuy & Hold baseline: {:.2} ({:+.2}%)",
            hold.final_balance,
            hold.total_return_pct()
        );
    }
    match (&run.forecast, &run.forecast_failure) {
        (Some(forecast), _) => print_forecast(forecast),
        (None, Some(failure)) => println!("\nFinal refit failed ({failure}); no forecast was made."),
        (None, None) => println!("\nNo usable model; no forecast was made."),
    }
}

fn print_summary(summary: &SeriesSummary) {
    let span = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "empty".to_string(),
    };
    println!("\n{} | {} closes | {}", summary.symbol, summary.observations, span);
    println!(
        "mean {:.4} | std {:.4} | min {:.4} | max {:.4}",
        summary.mean, summary.std, summary.min, summary.max
    );
}

fn print_forecast(forecast: &Forecast) {
    let as_of = forecast
        .as_of
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    println!(
        "\nNext close ({}, as of {}): {:.4} vs last {:.4} -> {}{}",
        forecast.label,
        as_of,
        forecast.predicted_close,
        forecast.last_close,
        if forecast.signal.is_long() { "LONG" } else { "FLAT" },
        if forecast.converged { "" } else { " (not converged)" }
    );
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cv_table(report: &CvReport) -> Table {
    let mut table = table();
    table.set_header(vec![
        "Model", "Status", "RMSE", "RMSE std", "MAE", "R²", "Folds (ok/nc/fail)",
    ]);
    for eval in &report.evaluations {
        table.add_row(vec![
            Cell::new(&eval.label),
            Cell::new(format!("{:?}", eval.status)),
            Cell::new(format!("{:.4}", eval.rmse.mean)),
            Cell::new(format!("{:.4}", eval.rmse.std)),
            Cell::new(format!("{:.4}", eval.mae.mean)),
            Cell::new(format!("{:.4}", eval.r2.mean)),
            Cell::new(format!(
                "{}/{}/{}",
                eval.converged_folds, eval.not_converged_folds, eval.failed_folds
            )),
        ]);
    }
    table
}

fn comparison_table(records: &[ComparisonRecord]) -> Table {
    let mut table = table();
    table.set_header(vec![
        "Error rank", "Profit rank", "Model", "RMSE", "Final balance", "Corr", "Err std",
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.error_rank),
            Cell::new(record.profit_rank.map_or_else(|| "-".to_string(), |r| r.to_string())),
            Cell::new(&record.label),
            Cell::new(format!("{:.4}", record.mean_rmse)),
            Cell::new(
                record
                    .final_balance
                    .map_or_else(|| "diverged".to_string(), |b| format!("{b:.2}")),
            ),
            Cell::new(optional(record.diagnostics.correlation)),
            Cell::new(optional(record.diagnostics.error_std)),
        ]);
    }
    table
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

// ==============================================================================
// Artifact Files
// ==============================================================================

#[derive(Serialize)]
struct EquityArtifact<'a> {
    #[serde(flatten)]
    simulation: &'a SimulationResult,
    total_return_pct: Decimal,
    cross_validation: Option<&'a ComparisonRecord>,
}

#[derive(Serialize)]
struct ComparisonArtifact<'a> {
    symbol: &'a str,
    kfold: usize,
    window: usize,
    features: Vec<String>,
    summary: &'a SeriesSummary,
    records: &'a [ComparisonRecord],
    unusable: &'a [String],
    mlp_error_std_gap: Option<f64>,
    buy_and_hold: Option<EquityArtifact<'a>>,
    forecast: Option<&'a Forecast>,
    forecast_failure: Option<&'a str>,
}

/// Writes the run's files under `<root>/<SYMBOL>/`.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: &Path, symbol: &str) -> Self {
        Self {
            dir: root.join(symbol),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the paths written, in write order.
    pub fn write_run(&self, run: &PredictionRun) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating output directory {}", self.dir.display()))?;
        let mut written = Vec::new();

        for simulation in run.completed_simulations() {
            let artifact = EquityArtifact {
                simulation,
                total_return_pct: simulation.total_return_pct(),
                cross_validation: run.comparison.get(&simulation.label),
            };
            written.push(self.write_json(&format!("equity_{}.json", file_stem(&simulation.label)), &artifact)?);
        }

        if let Some(pva) = &run.predicted_vs_actual {
            written.push(self.write_json("predicted_vs_actual.json", pva)?);
        }

        let comparison = ComparisonArtifact {
            symbol: &run.options.symbol,
            kfold: run.options.kfold,
            window: run.options.window,
            features: feature_names(run.options.window),
            summary: &run.summary,
            records: &run.comparison.records,
            unusable: &run.comparison.unusable,
            mlp_error_std_gap: run.comparison.mlp_error_std_gap,
            buy_and_hold: run.buy_and_hold.as_ref().map(|simulation| EquityArtifact {
                simulation,
                total_return_pct: simulation.total_return_pct(),
                cross_validation: None,
            }),
            forecast: run.forecast.as_ref(),
            forecast_failure: run.forecast_failure.as_deref(),
        };
        written.push(self.write_json("comparison.json", &comparison)?);

        if let Some(forecast) = &run.forecast {
            if let Some(model) = &forecast.model {
                let bytes = model.to_bytes()?;
                written.push(self.write_atomic(&format!("model_{}.bin", file_stem(&forecast.label)), &bytes)?);
            }
        }

        tracing::info!(dir = %self.dir.display(), files = written.len(), "Wrote run artifacts.");
        Ok(written)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> anyhow::Result<PathBuf> {
        let json = serde_json::to_vec_pretty(value).with_context(|| format!("serializing {name}"))?;
        self.write_atomic(name, &json)
    }

    /// Writes to a hidden sibling first and renames it into place.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let target = self.dir.join(name);
        let temp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&temp, bytes).with_context(|| format!("writing {}", temp.display()))?;
        fs::rename(&temp, &target).with_context(|| format!("moving {} into place", target.display()))?;
        Ok(target)
    }
}

/// `Poly_3` stays as is; anything outside `[A-Za-z0-9_-]` becomes `_`.
fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
