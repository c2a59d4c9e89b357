pub mod prepayment;
pub mod refinance;
pub mod schedule;
