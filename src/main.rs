mod report;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use configuration::{init_tracing, load_config, PredictOptions, Settings};
use datasource::{CsvDataSource, DataSource};
use pipeline::Pipeline;
use report::ArtifactWriter;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The main entry point for the Closecast forecasting tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = load_config(cli.config.as_deref())?;
    let _log_guard = init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Predict(args) => handle_predict(args, settings).await,
        Commands::Symbols => handle_symbols(&settings),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Next-close forecasting and profit backtesting for crypto assets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (default: ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cross-validate the model bank on one symbol and forecast its next close.
    Predict(PredictArgs),
    /// List the configured symbols that have a data file.
    Symbols,
}

#[derive(Parser)]
struct PredictArgs {
    #[command(flatten)]
    options: PredictOptions,

    /// Directory for the JSON artifacts (overrides `output.dir`).
    #[arg(long)]
    output: Option<PathBuf>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn data_source(settings: &Settings) -> CsvDataSource {
    CsvDataSource::new(&settings.data.dir, &settings.data.symbols)
}

/// Runs the pipeline on a blocking thread, racing it against Ctrl-C.
async fn handle_predict(args: PredictArgs, settings: Settings) -> anyhow::Result<()> {
    let options = args.options.validate()?;
    let output_root = args.output.unwrap_or_else(|| settings.output.dir.clone());

    let source = Arc::new(data_source(&settings));
    let pipeline = Pipeline::new(source, settings).with_progress(true);
    let cancel = pipeline.cancel_flag();

    let run_options = options.clone();
    let mut task = tokio::task::spawn_blocking(move || pipeline.run(&run_options));

    let run = tokio::select! {
        joined = &mut task => joined.context("prediction task panicked")??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received; stopping after the folds in flight.");
            cancel.store(true, Ordering::Relaxed);
            // Let the worker observe the flag before the runtime shuts down.
            let _ = task.await;
            bail!("prediction for {} was interrupted; no artifacts were written", options.symbol);
        }
    };

    report::print_run(&run);

    let writer = ArtifactWriter::new(&output_root, &options.symbol);
    let written = writer.write_run(&run)?;
    println!("\nWrote {} files to {}", written.len(), writer.dir().display());
    Ok(())
}

fn handle_symbols(settings: &Settings) -> anyhow::Result<()> {
    let available = data_source(settings).symbols();
    if available.is_empty() {
        println!("No data files found in {}", settings.data.dir.display());
        return Ok(());
    }
    for symbol in available {
        println!("{symbol}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_flags_parse_into_options() {
        let cli = Cli::try_parse_from([
            "closecast", "predict", "--crypto", "eth", "--kfold", "4", "--window", "10", "--compare",
            "--output", "out",
        ])
        .unwrap();
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        let options = args.options.validate().unwrap();
        assert_eq!(options.symbol, "ETH");
        assert_eq!((options.kfold, options.window, options.compare), (4, 10, true));
        assert_eq!(args.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn predict_defaults_to_mlp_only() {
        let cli = Cli::try_parse_from(["closecast", "predict", "--crypto", "BTC"]).unwrap();
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.options, PredictOptions::new("BTC"));
    }

    #[test]
    fn predict_requires_a_symbol() {
        assert!(Cli::try_parse_from(["closecast", "predict"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["closecast", "symbols", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }
}
