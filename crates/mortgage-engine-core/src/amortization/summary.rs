//! Schedule reduction into headline totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, ScheduleEntry};

/// Totals for any schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// The first month's payment. Representative of every month only for
    /// equal-installment loans; for equal-principal it is the first and
    /// highest payment.
    pub first_monthly_payment: Money,
}

/// Pure reduction over a schedule.
pub fn summarize(schedule: &[ScheduleEntry]) -> ScheduleSummary {
    let mut total_payment = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for entry in schedule {
        total_payment += entry.payment;
        total_interest += entry.interest_portion;
        total_principal += entry.principal_portion;
    }

    ScheduleSummary {
        total_payment,
        total_interest,
        total_principal,
        first_monthly_payment: schedule.first().map(|e| e.payment).unwrap_or(Decimal::ZERO),
    }
}
