//! Per-leg amortization schedules.
//!
//! Generates the month-by-month breakdown for a single loan leg under
//! either repayment convention. All math in `rust_decimal::Decimal`; the
//! generator is total — garbage inputs produce an all-zero schedule, never
//! a panic or an error.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value;
use crate::types::{LoanLeg, Money, RepaymentMethod, ScheduleEntry};

/// Balance below this is treated as fully repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Month-by-month schedule for one leg, with its totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegSchedule {
    /// Sanitized principal the schedule was generated from.
    pub principal: Money,
    pub entries: Vec<ScheduleEntry>,
    pub total_payment: Money,
    pub total_interest: Money,
}

impl LegSchedule {
    /// Outstanding balance right after the scheduled payment of `month`
    /// (1-based). Month 0 is the full principal; months past the end of the
    /// schedule are zero.
    pub fn balance_after(&self, month: u32) -> Money {
        if month == 0 {
            return self.principal;
        }
        match self.entries.get(month as usize - 1) {
            Some(entry) => entry.remaining_balance,
            None => Decimal::ZERO,
        }
    }
}

/// Generate the schedule for one leg. `start_month_offset` shifts the
/// 1-based month numbers, used when stitching a post-prepayment tail onto
/// an existing schedule.
pub fn leg_schedule(leg: &LoanLeg, start_month_offset: u32) -> LegSchedule {
    let leg = leg.sanitized();
    let n = leg.term_months;
    let principal = leg.principal;

    let mut entries = Vec::with_capacity(n as usize);
    let mut total_payment = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    if n == 0 {
        return LegSchedule {
            principal,
            entries,
            total_payment,
            total_interest,
        };
    }

    let r = leg.monthly_rate();
    let mut balance = principal;

    match leg.method {
        RepaymentMethod::EqualInstallment => {
            let payment = time_value::annuity_payment(principal, r, n);
            for i in 1..=n {
                let interest = balance * r;
                let principal_portion = payment - interest;
                balance = (balance - principal_portion).max(Decimal::ZERO);
                entries.push(ScheduleEntry {
                    month: start_month_offset + i,
                    payment,
                    principal_portion,
                    interest_portion: interest,
                    remaining_balance: balance,
                    date: None,
                });
            }
            // Constant payment admits the closed form.
            total_payment = payment * Decimal::from(n);
            total_interest = total_payment - principal;
        }
        RepaymentMethod::EqualPrincipal => {
            let principal_portion = principal / Decimal::from(n);
            for i in 1..=n {
                let interest = balance * r;
                let payment = principal_portion + interest;
                balance = (balance - principal_portion).max(Decimal::ZERO);
                total_payment += payment;
                total_interest += interest;
                entries.push(ScheduleEntry {
                    month: start_month_offset + i,
                    payment,
                    principal_portion,
                    interest_portion: interest,
                    remaining_balance: balance,
                    date: None,
                });
            }
        }
    }

    LegSchedule {
        principal,
        entries,
        total_payment,
        total_interest,
    }
}

/// Calendar date of a 1-based payment month given the first payment date.
pub fn payment_date(first_payment_date: NaiveDate, month: u32) -> NaiveDate {
    if month <= 1 {
        return first_payment_date;
    }
    first_payment_date
        .checked_add_months(Months::new(month - 1))
        .unwrap_or(first_payment_date)
}

/// Label schedule rows with calendar dates, in place.
pub fn attach_dates(entries: &mut [ScheduleEntry], first_payment_date: NaiveDate) {
    for entry in entries.iter_mut() {
        entry.date = Some(payment_date(first_payment_date, entry.month));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn reference_leg() -> LoanLeg {
        LoanLeg {
            principal: dec!(1_000_000),
            annual_rate_percent: dec!(3.5),
            term_months: 360,
            method: RepaymentMethod::EqualInstallment,
        }
    }

    // -----------------------------------------------------------------------
    // 1. Equal installment: constant payment, reference value
    // -----------------------------------------------------------------------
    #[test]
    fn test_equal_installment_constant_payment() {
        let sched = leg_schedule(&reference_leg(), 0);
        assert_eq!(sched.entries.len(), 360);

        let first = sched.entries[0].payment;
        assert_close(first, dec!(4490.45), dec!(0.5), "reference monthly payment");
        for entry in &sched.entries {
            assert_close(entry.payment, first, dec!(0.001), "payment constancy");
        }
    }

    // -----------------------------------------------------------------------
    // 2. Equal installment: principal sums back, terminal balance zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_equal_installment_principal_conservation() {
        let sched = leg_schedule(&reference_leg(), 0);

        let principal_sum: Decimal = sched.entries.iter().map(|e| e.principal_portion).sum();
        assert_close(
            principal_sum,
            dec!(1_000_000),
            dec!(1),
            "sum of principal portions",
        );
        assert_close(
            sched.entries.last().unwrap().remaining_balance,
            Decimal::ZERO,
            TOL,
            "terminal balance",
        );
    }

    // -----------------------------------------------------------------------
    // 3. Equal installment: totals via closed form
    // -----------------------------------------------------------------------
    #[test]
    fn test_equal_installment_totals() {
        let sched = leg_schedule(&reference_leg(), 0);
        // ~4490.45 * 360 - 1,000,000 ~ 616,560 of interest
        assert_close(
            sched.total_interest,
            dec!(616_560),
            dec!(250),
            "total interest",
        );
        assert_close(
            sched.total_payment,
            sched.total_interest + dec!(1_000_000),
            TOL,
            "payment = principal + interest",
        );
    }

    // -----------------------------------------------------------------------
    // 4. Every row: payment = principal + interest, balance non-increasing
    // -----------------------------------------------------------------------
    #[test]
    fn test_row_invariants() {
        let sched = leg_schedule(&reference_leg(), 0);

        let mut prev_balance = dec!(1_000_000);
        for entry in &sched.entries {
            assert_close(
                entry.payment,
                entry.principal_portion + entry.interest_portion,
                dec!(0.001),
                "payment split",
            );
            assert!(
                entry.remaining_balance <= prev_balance + TOL,
                "month {}: balance {} above previous {}",
                entry.month,
                entry.remaining_balance,
                prev_balance
            );
            assert!(entry.remaining_balance >= Decimal::ZERO);
            prev_balance = entry.remaining_balance;
        }
    }

    // -----------------------------------------------------------------------
    // 5. Equal principal: constant principal, declining interest and payment
    // -----------------------------------------------------------------------
    #[test]
    fn test_equal_principal_monotonicity() {
        let leg = LoanLeg {
            principal: dec!(600_000),
            annual_rate_percent: dec!(4.0),
            term_months: 240,
            method: RepaymentMethod::EqualPrincipal,
        };
        let sched = leg_schedule(&leg, 0);
        assert_eq!(sched.entries.len(), 240);

        let portion = sched.entries[0].principal_portion;
        assert_close(portion, dec!(2500), TOL, "600k / 240 principal portion");

        for window in sched.entries.windows(2) {
            assert_close(
                window[1].principal_portion,
                portion,
                dec!(0.001),
                "principal portion constancy",
            );
            assert!(
                window[1].interest_portion <= window[0].interest_portion,
                "interest must not increase"
            );
            assert!(
                window[1].payment <= window[0].payment,
                "payment must not increase"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 6. Equal principal: accumulated totals match the rows
    // -----------------------------------------------------------------------
    #[test]
    fn test_equal_principal_totals_accumulate() {
        let leg = LoanLeg {
            principal: dec!(240_000),
            annual_rate_percent: dec!(3.0),
            term_months: 120,
            method: RepaymentMethod::EqualPrincipal,
        };
        let sched = leg_schedule(&leg, 0);

        let paid: Decimal = sched.entries.iter().map(|e| e.payment).sum();
        let interest: Decimal = sched.entries.iter().map(|e| e.interest_portion).sum();
        assert_close(sched.total_payment, paid, dec!(0.001), "total payment");
        assert_close(sched.total_interest, interest, dec!(0.001), "total interest");
    }

    // -----------------------------------------------------------------------
    // 7. Zero principal: well-defined all-zero schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_principal_all_zero() {
        let leg = LoanLeg {
            principal: Decimal::ZERO,
            annual_rate_percent: dec!(5.0),
            term_months: 24,
            method: RepaymentMethod::EqualInstallment,
        };
        let sched = leg_schedule(&leg, 0);
        assert_eq!(sched.entries.len(), 24);
        for entry in &sched.entries {
            assert_eq!(entry.payment, Decimal::ZERO);
            assert_eq!(entry.remaining_balance, Decimal::ZERO);
        }
        assert_eq!(sched.total_payment, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 8. Negative inputs clamp to zero instead of erroring
    // -----------------------------------------------------------------------
    #[test]
    fn test_negative_inputs_clamped() {
        let leg = LoanLeg {
            principal: dec!(-100_000),
            annual_rate_percent: dec!(-3),
            term_months: 12,
            method: RepaymentMethod::EqualPrincipal,
        };
        let sched = leg_schedule(&leg, 0);
        assert_eq!(sched.principal, Decimal::ZERO);
        assert!(sched.entries.iter().all(|e| e.payment == Decimal::ZERO));
    }

    // -----------------------------------------------------------------------
    // 9. Zero rate: straight division
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_rate_schedule() {
        let leg = LoanLeg {
            principal: dec!(120_000),
            annual_rate_percent: Decimal::ZERO,
            term_months: 120,
            method: RepaymentMethod::EqualInstallment,
        };
        let sched = leg_schedule(&leg, 0);
        assert_close(sched.entries[0].payment, dec!(1000), TOL, "zero-rate payment");
        assert_eq!(sched.entries[0].interest_portion, Decimal::ZERO);
        assert_close(
            sched.entries.last().unwrap().remaining_balance,
            Decimal::ZERO,
            TOL,
            "zero-rate terminal balance",
        );
    }

    // -----------------------------------------------------------------------
    // 10. Month offset shifts numbering for stitched tails
    // -----------------------------------------------------------------------
    #[test]
    fn test_start_month_offset() {
        let leg = LoanLeg {
            principal: dec!(50_000),
            annual_rate_percent: dec!(4.0),
            term_months: 12,
            method: RepaymentMethod::EqualInstallment,
        };
        let sched = leg_schedule(&leg, 60);
        assert_eq!(sched.entries.first().unwrap().month, 61);
        assert_eq!(sched.entries.last().unwrap().month, 72);
    }

    // -----------------------------------------------------------------------
    // 11. balance_after: month 0, mid-loan, past the end
    // -----------------------------------------------------------------------
    #[test]
    fn test_balance_after_lookup() {
        let sched = leg_schedule(&reference_leg(), 0);
        assert_eq!(sched.balance_after(0), dec!(1_000_000));
        assert!(sched.balance_after(60) < dec!(1_000_000));
        assert!(sched.balance_after(60) > dec!(850_000));
        assert_eq!(sched.balance_after(999), Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 12. Calendar labeling from a first payment date
    // -----------------------------------------------------------------------
    #[test]
    fn test_attach_dates() {
        let leg = LoanLeg {
            principal: dec!(10_000),
            annual_rate_percent: dec!(3.0),
            term_months: 3,
            method: RepaymentMethod::EqualInstallment,
        };
        let mut sched = leg_schedule(&leg, 0);
        let first = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        attach_dates(&mut sched.entries, first);

        assert_eq!(sched.entries[0].date, Some(first));
        assert_eq!(
            sched.entries[2].date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap())
        );
    }
}
