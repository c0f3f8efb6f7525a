use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar. Only the close drives the models; volume is carried
/// along for the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

/// An immutable, strictly date-ordered price history for one symbol.
///
/// The series is built once by a data source and then only ever borrowed,
/// which is what lets the cross-validation workers share it without locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, rejecting bars that are not strictly increasing by date.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(CoreError::InvalidInput(
                "PriceSeries".to_string(),
                format!(
                    "{}: bar dated {} does not follow {}",
                    symbol, pair[1].date, pair[0].date
                ),
            ));
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// One supervised sample: `W` past closes (oldest first) and the close that followed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWindow {
    pub features: Vec<f64>,
    pub label: f64,
    pub anchor_date: NaiveDate,
}

impl FeatureWindow {
    /// The close immediately before the anchor date, i.e. the last known price
    /// when the forecast for `label` is made.
    pub fn prior_close(&self) -> f64 {
        self.features.last().copied().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn accepts_strictly_increasing_dates() {
        let series = PriceSeries::new("BTC", vec![bar(1, 10.0), bar(2, 11.0), bar(5, 9.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 9.0]);
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn rejects_duplicate_or_backwards_dates() {
        assert!(PriceSeries::new("BTC", vec![bar(2, 10.0), bar(2, 11.0)]).is_err());
        assert!(PriceSeries::new("BTC", vec![bar(3, 10.0), bar(1, 11.0)]).is_err());
    }

    #[test]
    fn prior_close_is_last_feature() {
        let sample = FeatureWindow {
            features: vec![10.0, 12.0, 11.0],
            label: 13.0,
            anchor_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        };
        assert_eq!(sample.prior_close(), 11.0);
    }
}
