use crate::{DataError, DataSource};
use core_types::PriceSeries;
use std::collections::BTreeMap;

/// A data source over series that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    series: BTreeMap<String, PriceSeries>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `series` under its own symbol, replacing any previous entry.
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol().to_uppercase(), series);
        self
    }
}

impl DataSource for InMemoryDataSource {
    fn load(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        self.series
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| DataError::UnknownSymbol(symbol.to_string()))
    }

    fn symbols(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }
}
