use serde::{Deserialize, Serialize};

/// Exposure held over a single daily interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    Long,
    #[default]
    Flat,
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long)
    }
}
