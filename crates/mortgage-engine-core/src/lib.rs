pub mod amortization;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "prepayment")]
pub mod prepayment;

#[cfg(feature = "refinance")]
pub mod refinance;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all engine operations
pub type MortgageResult<T> = Result<T, MortgageError>;
