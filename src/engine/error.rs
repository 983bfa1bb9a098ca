//! Typed failure taxonomy for the scalping engine.
//!
//! Three kinds of failure, distinguishable by variant rather than message
//! text: construction errors (fatal, the engine cannot be used), lifecycle
//! precondition violations, and per-row computation errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    // Construction errors
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    #[error("hedge frequency must be at least one day")]
    ZeroHedgeFrequency,

    // Precondition violations
    #[error("a position opened on {0} is still active")]
    PositionAlreadyOpen(NaiveDate),

    #[error("{0} requires an open position")]
    NoOpenPosition(&'static str),

    #[error("market rows must arrive in ascending date order: {current} after {previous}")]
    NonMonotonicRow {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid option type {0:?}: expected \"call\" or \"put\"")]
    InvalidOptionType(String),

    // Computation errors, wrapped with the stage that produced them
    #[error("delta calculation failed: {0}")]
    DeltaFailed(String),

    #[error("open failed: {0}")]
    OpenFailed(String),

    #[error("hedge failed: {0}")]
    HedgeFailed(String),

    #[error("close failed: {0}")]
    CloseFailed(String),
}

impl EngineError {
    /// Whether the error makes the engine unusable (caught once at startup),
    /// as opposed to a per-row failure the caller may choose to skip.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::NonPositiveCapital(_) | EngineError::ZeroHedgeFrequency
        )
    }
}
