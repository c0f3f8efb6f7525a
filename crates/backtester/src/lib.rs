//! Daily-reinvestment replay of a model's next-close forecasts.
//!
//! Each day the simulator goes long for the interval if the forecast is above
//! the prior close and stays flat otherwise. While long, the whole balance
//! compounds with the realised return; there are no fees or slippage.

pub mod error;
pub mod simulator;

pub use error::SimulationError;
pub use simulator::{steps_from_series, ProfitSimulator, SimulationResult, TradingDay, BUY_AND_HOLD_LABEL};
