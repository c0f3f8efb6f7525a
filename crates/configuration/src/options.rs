use crate::error::ConfigError;

pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_KFOLD: usize = 5;

/// The per-invocation options of the `predict` command.
///
/// Validated once at the boundary; everything downstream trusts it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct PredictOptions {
    /// Ticker of the asset to forecast (e.g., "BTC").
    #[cfg_attr(feature = "clap", arg(long = "crypto"))]
    pub symbol: String,

    /// Number of time-ordered cross-validation folds.
    #[cfg_attr(feature = "clap", arg(long, default_value_t = DEFAULT_KFOLD))]
    pub kfold: usize,

    /// Number of past closes used as features.
    #[cfg_attr(feature = "clap", arg(long, default_value_t = DEFAULT_WINDOW))]
    pub window: usize,

    /// Also evaluate Linear and Polynomial (degrees 2-10) regressions.
    #[cfg_attr(feature = "clap", arg(long, default_value_t = false))]
    pub compare: bool,
}

impl PredictOptions {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kfold: DEFAULT_KFOLD,
            window: DEFAULT_WINDOW,
            compare: false,
        }
    }

    /// Normalises the symbol and checks the bounds that do not depend on the data.
    ///
    /// `window < series length` and `kfold <= sample count` can only be checked
    /// once the series is loaded; the windower and the fold builder enforce those.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.symbol = self.symbol.trim().to_uppercase();
        if self.symbol.is_empty() {
            return Err(ConfigError::InvalidArgument(
                "--crypto must name a symbol".to_string(),
            ));
        }
        if self.kfold < 2 {
            return Err(ConfigError::InvalidArgument(format!(
                "--kfold must be at least 2, got {}",
                self.kfold
            )));
        }
        if self.window < 1 {
            return Err(ConfigError::InvalidArgument(
                "--window must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
