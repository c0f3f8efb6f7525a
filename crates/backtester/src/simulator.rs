use crate::error::SimulationError;
use analytics::Drawdown;
use core_types::Position;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

pub const BUY_AND_HOLD_LABEL: &str = "Buy & Hold";

/// One daily interval: the close it opens at, the forecast of the close it
/// ends at, and the close it actually ends at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingDay {
    pub prior_close: f64,
    pub predicted_close: f64,
    pub actual_close: f64,
}

impl TradingDay {
    /// Long when the forecast is strictly above the prior close.
    pub fn signal(&self) -> Position {
        if self.predicted_close > self.prior_close {
            Position::Long
        } else {
            Position::Flat
        }
    }
}

/// Builds trading days from a realised close series and aligned forecasts,
/// where `predicted[t]` is the forecast of `actual[t + 1]`.
///
/// `predicted` may carry one extra trailing forecast with no realised close;
/// it is ignored here.
pub fn steps_from_series(actual: &[f64], predicted: &[f64]) -> Result<Vec<TradingDay>, SimulationError> {
    let expected = actual.len().saturating_sub(1);
    if predicted.len() != expected && predicted.len() != actual.len() {
        return Err(SimulationError::LengthMismatch {
            expected,
            actual_len: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(actual
        .windows(2)
        .zip(predicted)
        .map(|(pair, &predicted_close)| TradingDay {
            prior_close: pair[0],
            predicted_close,
            actual_close: pair[1],
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub label: String,
    /// The initial balance followed by the balance after each day.
    pub equity_curve: Vec<Decimal>,
    /// Position held over each day.
    pub positions: Vec<Position>,
    pub final_balance: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub days_long: usize,
}

impl SimulationResult {
    /// Final balance relative to the start, in percent.
    pub fn total_return_pct(&self) -> Decimal {
        match self.equity_curve.first() {
            Some(&start) if start > Decimal::ZERO => {
                (self.final_balance - start) / start * Decimal::ONE_HUNDRED
            }
            _ => Decimal::ZERO,
        }
    }
}

/// Deterministic replay of forecasts against realised closes.
#[derive(Debug, Clone)]
pub struct ProfitSimulator {
    initial_balance: Decimal,
}

impl ProfitSimulator {
    pub fn new(initial_balance: Decimal) -> Self {
        Self { initial_balance }
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    pub fn simulate(&self, label: &str, days: &[TradingDay]) -> Result<SimulationResult, SimulationError> {
        let positions: Vec<Position> = days
            .iter()
            .enumerate()
            .map(|(i, day)| {
                if !day.predicted_close.is_finite() {
                    tracing::warn!(model = label, day = i, "Non-finite forecast; staying flat.");
                }
                day.signal()
            })
            .collect();
        self.replay(label, days, positions)
    }

    /// Always long; the unranked baseline.
    pub fn buy_and_hold(&self, days: &[TradingDay]) -> Result<SimulationResult, SimulationError> {
        self.replay(BUY_AND_HOLD_LABEL, days, vec![Position::Long; days.len()])
    }

    fn replay(
        &self,
        label: &str,
        days: &[TradingDay],
        positions: Vec<Position>,
    ) -> Result<SimulationResult, SimulationError> {
        let mut balance = self.initial_balance;
        let mut equity_curve = Vec::with_capacity(days.len() + 1);
        equity_curve.push(balance);

        for (i, (day, position)) in days.iter().zip(&positions).enumerate() {
            let prior = to_price(day.prior_close, i, "prior close")?;
            let actual = to_price(day.actual_close, i, "close")?;
            if position.is_long() {
                let growth = Decimal::ONE + (actual - prior) / prior;
                balance = balance.checked_mul(growth).ok_or_else(|| SimulationError::Divergence {
                    day: i,
                    reason: "balance overflowed".to_string(),
                })?;
            }
            equity_curve.push(balance);
        }

        let drawdown = Drawdown::from_curve(&equity_curve);
        let days_long = positions.iter().filter(|p| p.is_long()).count();
        tracing::debug!(model = label, days = days.len(), days_long, final_balance = %balance, "Simulation complete.");

        Ok(SimulationResult {
            label: label.to_string(),
            equity_curve,
            positions,
            final_balance: balance,
            max_drawdown: drawdown.absolute,
            max_drawdown_pct: drawdown.pct,
            days_long,
        })
    }
}

fn to_price(value: f64, day: usize, what: &str) -> Result<Decimal, SimulationError> {
    let divergence = || SimulationError::Divergence {
        day,
        reason: format!("{what} {value} is not a positive finite price"),
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(divergence());
    }
    Decimal::from_f64(value).ok_or_else(divergence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rust_decimal_macros::dec;

    fn days(actual: &[f64], predicted: &[f64]) -> Vec<TradingDay> {
        steps_from_series(actual, predicted).unwrap()
    }

    #[test]
    fn scenario_b_follows_the_compounding_recurrence() {
        let sim = ProfitSimulator::new(dec!(100));
        let result = sim
            .simulate("MLP", &days(&[13.0, 14.0, 16.0], &[13.5, 14.2, 15.0]))
            .unwrap();

        // 100 * 14/13, then * 16/14
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(result.equity_curve[1].round_dp(6), dec!(107.692308));
        assert_eq!(result.final_balance.round_dp(6), dec!(123.076923));
        assert_eq!(result.days_long, 2);
        assert_eq!(result.max_drawdown, Decimal::ZERO);
    }

    #[test]
    fn final_balance_is_the_product_of_long_day_returns() {
        let actual = [100.0, 110.0, 99.0, 120.0, 120.0, 90.0, 95.0];
        // long, flat, long, flat, long, long
        let predicted = [101.0, 100.0, 100.0, 119.0, 121.0, 96.0];
        let result = ProfitSimulator::new(dec!(1000))
            .simulate("Linear", &days(&actual, &predicted))
            .unwrap();

        let expected = 1000.0 * (110.0 / 100.0) * (120.0 / 99.0) * (90.0 / 120.0) * (95.0 / 90.0);
        assert_abs_diff_eq!(result.final_balance.to_f64().unwrap(), expected, epsilon = 1e-9);
        assert_eq!(result.days_long, 4);
        // the flat day after 110 leaves the balance untouched
        assert_eq!(result.equity_curve[2], result.equity_curve[1]);
    }

    #[test]
    fn all_flat_run_keeps_the_initial_balance() {
        let actual = [5.0, 6.0, 4.0, 9.0];
        let result = ProfitSimulator::new(dec!(1000))
            .simulate("Poly_2", &days(&actual, &[1.0, 1.0, 1.0]))
            .unwrap();
        assert!(result.equity_curve.iter().all(|b| *b == dec!(1000)));
        assert_eq!(result.days_long, 0);
    }

    #[test]
    fn equal_forecast_is_not_a_long_signal() {
        let day = TradingDay {
            prior_close: 10.0,
            predicted_close: 10.0,
            actual_close: 11.0,
        };
        assert_eq!(day.signal(), Position::Flat);
    }

    #[test]
    fn non_finite_forecast_stays_flat() {
        let result = ProfitSimulator::new(dec!(1000))
            .simulate("MLP", &days(&[10.0, 20.0], &[f64::NAN]))
            .unwrap();
        assert_eq!(result.final_balance, dec!(1000));
        assert_eq!(result.positions, vec![Position::Flat]);
    }

    #[test]
    fn bad_closes_diverge() {
        let sim = ProfitSimulator::new(dec!(1000));
        assert!(matches!(
            sim.simulate("MLP", &days(&[10.0, 0.0, 12.0], &[11.0, 1.0])),
            Err(SimulationError::Divergence { day: 0, .. })
        ));
        assert!(matches!(
            sim.simulate("MLP", &days(&[10.0, 11.0, f64::NAN], &[11.0, 12.0])),
            Err(SimulationError::Divergence { day: 1, .. })
        ));
    }

    #[test]
    fn drawdown_tracks_the_equity_curve() {
        let result = ProfitSimulator::new(dec!(100))
            .buy_and_hold(&days(&[10.0, 20.0, 10.0, 15.0], &[0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(result.equity_curve, vec![dec!(100), dec!(200), dec!(100), dec!(150)]);
        assert_eq!(result.max_drawdown, dec!(100));
        assert_eq!(result.max_drawdown_pct, dec!(50));
        assert_eq!(result.label, BUY_AND_HOLD_LABEL);
        assert_eq!(result.total_return_pct(), dec!(50));
    }

    #[test]
    fn series_alignment_accepts_a_trailing_forecast_only() {
        let actual = [1.0, 2.0, 3.0];
        assert_eq!(steps_from_series(&actual, &[1.5, 2.5]).unwrap().len(), 2);
        assert_eq!(steps_from_series(&actual, &[1.5, 2.5, 3.5]).unwrap().len(), 2);
        assert!(matches!(
            steps_from_series(&actual, &[1.5]),
            Err(SimulationError::LengthMismatch { expected: 2, got: 1, .. })
        ));
    }
}
