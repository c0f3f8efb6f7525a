use crate::{DataError, DataSource};
use chrono::{NaiveDate, NaiveDateTime};
use core_types::{PriceBar, PriceSeries};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Reads daily price history from `<dir>/<SYMBOL>.csv`.
///
/// The expected layout is the common exchange-export format: an optional
/// provider banner line, then a header containing at least `date` and `close`
/// (matched case-insensitively) and usually one or more `Volume ...` columns.
/// Rows may be newest-first; they are re-ordered by date on load.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
    universe: Vec<String>,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>, universe: &[String]) -> Self {
        Self {
            dir: dir.into(),
            universe: universe.iter().map(|s| s.to_uppercase()).collect(),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_frame(path: &Path) -> Result<DataFrame, DataError> {
        let skip_rows = if has_banner(path)? { 1 } else { 0 };
        let df = CsvReader::from_path(path)?
            .has_header(true)
            .with_skip_rows(skip_rows)
            .finish()?;
        Ok(df)
    }
}

impl DataSource for CsvDataSource {
    fn load(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let symbol = symbol.trim().to_uppercase();
        if !self.universe.contains(&symbol) {
            return Err(DataError::UnknownSymbol(symbol));
        }

        let path = self.path_for(&symbol);
        if !path.is_file() {
            return Err(DataError::NotFound { symbol, path });
        }

        let df = Self::read_frame(&path)?;
        let bars = bars_from_frame(&symbol, &df)?;
        tracing::info!(symbol = %symbol, rows = bars.len(), path = %path.display(), "Loaded price history.");

        PriceSeries::new(symbol.clone(), bars).map_err(|e| DataError::Malformed {
            symbol,
            reason: e.to_string(),
        })
    }

    fn symbols(&self) -> Vec<String> {
        self.universe
            .iter()
            .filter(|s| self.path_for(s).is_file())
            .cloned()
            .collect()
    }
}

/// Exchange exports put a URL banner above the header; a header line always names `date`.
fn has_banner(path: &Path) -> Result<bool, DataError> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;
    Ok(!first_line.to_lowercase().contains("date"))
}

fn bars_from_frame(symbol: &str, df: &DataFrame) -> Result<Vec<PriceBar>, DataError> {
    let malformed = |reason: String| DataError::Malformed {
        symbol: symbol.to_string(),
        reason,
    };

    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    let find = |want: &str| names.iter().find(|n| n.trim().eq_ignore_ascii_case(want)).cloned();

    let date_col = find("date").ok_or_else(|| malformed("missing 'date' column".to_string()))?;
    let close_col = find("close").ok_or_else(|| malformed("missing 'close' column".to_string()))?;
    // The quote-currency volume is listed last in exchange exports.
    let volume_col = names
        .iter()
        .rev()
        .find(|n| n.trim().to_lowercase().starts_with("volume"))
        .cloned();

    let dates = df.column(&date_col)?.cast(&DataType::String)?;
    let closes = df.column(&close_col)?.cast(&DataType::Float64)?;
    let volumes = match &volume_col {
        Some(name) => Some(df.column(name)?.cast(&DataType::Float64)?),
        None => None,
    };

    let dates = dates.str()?;
    let closes = closes.f64()?;
    let volumes = match &volumes {
        Some(v) => Some(v.f64()?),
        None => None,
    };

    let mut bars = Vec::with_capacity(df.height());
    for (row, (date, close)) in dates.into_iter().zip(closes.into_iter()).enumerate() {
        let raw_date = date.ok_or_else(|| malformed(format!("row {row}: empty date")))?;
        let date = parse_date(raw_date)
            .ok_or_else(|| malformed(format!("row {row}: unrecognised date '{raw_date}'")))?;
        let close = close.ok_or_else(|| malformed(format!("row {row}: empty close")))?;
        let volume = volumes.and_then(|v| v.get(row)).unwrap_or(0.0);
        bars.push(PriceBar { date, close, volume });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok().map(|dt| dt.date()))
        .or_else(|| DATE_FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(raw, f).ok()))
}
