//! # Price Data Sources
//!
//! This crate hides where price history comes from. The rest of the workspace
//! only ever sees a validated, date-ordered `PriceSeries`.
//!
//! ## Public API
//!
//! - `DataSource`: the trait the pipeline loads series through.
//! - `CsvDataSource`: reads one `<SYMBOL>.csv` per asset from a directory.
//! - `InMemoryDataSource`: a fixed map of series, for tests and embedding.
//! - `DataError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod csv_source;
pub mod error;
pub mod memory;

// Re-export the key components to create a clean, public-facing API.
pub use csv_source::CsvDataSource;
pub use error::DataError;
pub use memory::InMemoryDataSource;

use core_types::PriceSeries;

/// Supplies an ordered price series per symbol.
///
/// `Send + Sync` so a single source can back concurrent runs.
pub trait DataSource: Send + Sync {
    /// Loads the full history for `symbol`.
    ///
    /// Fails with `DataError::UnknownSymbol` for tickers outside the source's universe.
    fn load(&self, symbol: &str) -> Result<PriceSeries, DataError>;

    /// The symbols this source can currently serve.
    fn symbols(&self) -> Vec<String>;
}
