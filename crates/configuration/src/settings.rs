use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty or missing `config.toml` is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub model: ModelSettings,
    pub simulation: SimulationSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
    pub parallelism: ParallelismSettings,
}

impl Settings {
    /// Checks the invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.initial_balance <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "simulation.initial_balance must be positive".to_string(),
            ));
        }
        self.model.mlp.validate()
    }
}

/// Where price history lives and which tickers are recognised.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding one `<SYMBOL>.csv` per asset.
    pub dir: PathBuf,
    /// The recognised symbol universe. Anything else is an unknown symbol.
    pub symbols: Vec<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            symbols: ["ADA", "AVAX", "BNB", "BTC", "DOGE", "DOT", "ETH", "SHIB", "SOL", "XRP"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub mlp: MlpParams,
}

/// Hidden-layer activation for the MLP regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

/// Parameters for the multi-layer perceptron regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    pub hidden_layer_sizes: Vec<usize>,
    pub activation: Activation,
    /// Hard cap on training epochs. Reaching it is a warning, not an error.
    pub max_iter: usize,
    /// Seed for weight initialisation and mini-batch shuffling.
    pub seed: u64,
    pub learning_rate_init: f64,
    /// L2 penalty on the weights.
    pub alpha: f64,
    pub batch_size: usize,
    /// Minimum loss improvement that counts as progress.
    pub tol: f64,
    pub n_iter_no_change: usize,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![100, 50],
            activation: Activation::Relu,
            max_iter: 500,
            seed: 42,
            learning_rate_init: 1e-3,
            alpha: 1e-4,
            batch_size: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
        }
    }
}

impl MlpParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hidden_layer_sizes.is_empty() || self.hidden_layer_sizes.contains(&0) {
            return Err(ConfigError::ValidationError(
                "model.mlp.hidden_layer_sizes must list at least one non-empty layer".to_string(),
            ));
        }
        if self.max_iter == 0 || self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.mlp.max_iter and model.mlp.batch_size must be positive".to_string(),
            ));
        }
        if !(self.learning_rate_init.is_finite() && self.learning_rate_init > 0.0) {
            return Err(ConfigError::ValidationError(
                "model.mlp.learning_rate_init must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contains parameters for the profit simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// The starting balance every equity curve is normalised to.
    pub initial_balance: Decimal,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_balance: dec!(1000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory for rendered artifacts; one subdirectory per symbol.
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Fallback filter directive when `RUST_LOG` is not set.
    pub level: String,
    pub dir: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
            file: "predict.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParallelismSettings {
    /// Worker threads for model training. `None` uses one per core.
    pub threads: Option<usize>,
}
