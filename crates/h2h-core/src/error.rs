// Error types for the comparison core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("gameweek {value} is outside the season range {min}..={max}")]
    GameweekOutOfRange { value: i64, min: u8, max: u8 },

    #[error("cannot compare squads from different gameweeks ({a} vs {b})")]
    GameweekMismatch { a: u8, b: u8 },
}
