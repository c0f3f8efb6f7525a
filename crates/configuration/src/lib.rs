use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod options;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use options::PredictOptions;
pub use settings::{
    Activation, DataSettings, LoggingSettings, MlpParams, ModelSettings, OutputSettings,
    ParallelismSettings, Settings, SimulationSettings,
};
pub use telemetry::init_tracing;

/// Prefix for environment overrides, e.g. `CLOSECAST__DATA__DIR=/srv/prices`.
const ENV_PREFIX: &str = "CLOSECAST";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file
/// (`config.toml` in the working directory unless `path` is given), and
/// `CLOSECAST__*` environment variables. A missing default file is not an
/// error; a missing explicit `path` is.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file_source = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn missing_default_file_yields_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model.mlp.hidden_layer_sizes, vec![100, 50]);
        assert_eq!(settings.model.mlp.max_iter, 500);
        assert_eq!(settings.simulation.initial_balance, dec!(1000));
        assert_eq!(settings.data.symbols.len(), 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn explicit_file_overrides_selected_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[data]\ndir = \"prices\"\n\n[model.mlp]\nmax_iter = 50\nactivation = \"tanh\"\n\n[simulation]\ninitial_balance = 100"
        )
        .unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.data.dir, std::path::PathBuf::from("prices"));
        assert_eq!(settings.model.mlp.max_iter, 50);
        assert_eq!(settings.model.mlp.activation, Activation::Tanh);
        // untouched fields keep their defaults
        assert_eq!(settings.model.mlp.seed, 42);
        assert_eq!(settings.simulation.initial_balance, dec!(100));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_config(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn invalid_file_values_are_rejected_on_load() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[simulation]\ninitial_balance = 0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn non_positive_balance_fails_validation() {
        let mut settings = Settings::default();
        settings.simulation.initial_balance = dec!(0);
        assert!(matches!(settings.validate(), Err(ConfigError::ValidationError(_))));
    }
}
