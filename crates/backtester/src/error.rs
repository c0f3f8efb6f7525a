use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A close that cannot be compounded (NaN, infinite or non-positive),
    /// or a balance that left the representable range.
    #[error("Simulation diverged on day {day}: {reason}")]
    Divergence { day: usize, reason: String },

    #[error("Expected {expected} predictions for {actual_len} closes, got {got}")]
    LengthMismatch {
        expected: usize,
        actual_len: usize,
        got: usize,
    },
}
