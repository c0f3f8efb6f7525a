use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest peak-to-trough decline of an equity curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// In balance units.
    pub absolute: Decimal,
    /// In percent of the running peak at the trough.
    pub pct: Decimal,
}

impl Drawdown {
    pub fn from_curve(equity_curve: &[Decimal]) -> Self {
        let Some(&first) = equity_curve.first() else {
            return Self::default();
        };

        let mut peak = first;
        let mut worst = Self::default();
        for &equity in equity_curve {
            if equity > peak {
                peak = equity;
            }
            let decline = peak - equity;
            if decline > worst.absolute {
                worst.absolute = decline;
            }
            if peak > Decimal::ZERO {
                let pct = decline / peak * Decimal::ONE_HUNDRED;
                if pct > worst.pct {
                    worst.pct = pct;
                }
            }
        }
        worst
    }
}
