use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Monthly rate as a decimal fraction from an annual percentage.
/// Negative input clamps to zero.
pub fn monthly_rate(annual_rate_percent: Rate) -> Rate {
    annual_rate_percent.max(Decimal::ZERO) / dec!(1200)
}

/// Level payment that amortizes `principal` over `months` at `monthly_rate`:
/// `P * r * (1+r)^n / ((1+r)^n - 1)`. Zero-rate loans pay `P / n`.
pub fn annuity_payment(principal: Money, monthly_rate: Rate, months: u32) -> Money {
    if months == 0 || principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if monthly_rate <= Decimal::ZERO {
        return principal / Decimal::from(months);
    }

    let growth = (Decimal::ONE + monthly_rate).powd(Decimal::from(months));
    let denom = growth - Decimal::ONE;
    if denom <= Decimal::ZERO {
        // powd underflow at vanishing rates; fall back to the zero-rate split
        return principal / Decimal::from(months);
    }
    principal * monthly_rate * growth / denom
}

/// Closed-form outstanding balance of a level-payment loan after
/// `months_paid` payments: `P*(1+r)^k - pmt*((1+r)^k - 1)/r`, clamped at 0.
pub fn annuity_balance_after(
    principal: Money,
    monthly_rate: Rate,
    payment: Money,
    months_paid: u32,
) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if monthly_rate <= Decimal::ZERO {
        return (principal - payment * Decimal::from(months_paid)).max(Decimal::ZERO);
    }

    let growth = (Decimal::ONE + monthly_rate).powd(Decimal::from(months_paid));
    let balance = principal * growth - payment * (growth - Decimal::ONE) / monthly_rate;
    balance.max(Decimal::ZERO)
}

/// Number of months needed for an annuity of `payment` to retire
/// `principal`: `ceil( ln(pmt / (pmt - r*P)) / ln(1+r) )`.
///
/// Returns `None` when the payment cannot retire the principal because it
/// does not cover the monthly interest accrual (`payment <= r * principal`).
pub fn months_to_amortize(principal: Money, monthly_rate: Rate, payment: Money) -> Option<u32> {
    if principal <= Decimal::ZERO {
        return Some(0);
    }
    if payment <= Decimal::ZERO {
        return None;
    }
    if monthly_rate <= Decimal::ZERO {
        return (principal / payment).ceil().to_u32();
    }

    let interest_floor = principal * monthly_rate;
    if payment <= interest_floor {
        return None;
    }

    let ratio = payment / (payment - interest_floor);
    let months = (ratio.ln() / (Decimal::ONE + monthly_rate).ln()).ceil();
    months.to_u32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

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

    #[test]
    fn test_monthly_rate_conversion() {
        assert_close(
            monthly_rate(dec!(3.5)),
            dec!(0.00291666667),
            dec!(0.0000000001),
            "3.5%/yr monthly rate",
        );
        assert_eq!(monthly_rate(dec!(-2)), Decimal::ZERO);
    }

    #[test]
    fn test_annuity_payment_reference_loan() {
        // 1,000,000 over 360 months at 3.5%/yr: ~4,490.45/month
        let pmt = annuity_payment(dec!(1_000_000), monthly_rate(dec!(3.5)), 360);
        assert_close(pmt, dec!(4490.45), dec!(0.5), "reference annuity payment");
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let pmt = annuity_payment(dec!(120_000), Decimal::ZERO, 120);
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_annuity_payment_degenerate_inputs() {
        assert_eq!(annuity_payment(dec!(1000), dec!(0.005), 0), Decimal::ZERO);
        assert_eq!(annuity_payment(dec!(-1000), dec!(0.005), 12), Decimal::ZERO);
    }

    #[test]
    fn test_balance_after_full_term_is_zero() {
        let r = monthly_rate(dec!(3.5));
        let pmt = annuity_payment(dec!(1_000_000), r, 360);
        let balance = annuity_balance_after(dec!(1_000_000), r, pmt, 360);
        assert_close(balance, Decimal::ZERO, dec!(0.01), "terminal balance");
    }

    #[test]
    fn test_balance_after_is_decreasing() {
        let r = monthly_rate(dec!(4.0));
        let pmt = annuity_payment(dec!(500_000), r, 240);
        let b60 = annuity_balance_after(dec!(500_000), r, pmt, 60);
        let b120 = annuity_balance_after(dec!(500_000), r, pmt, 120);
        assert!(b60 < dec!(500_000));
        assert!(b120 < b60);
        assert!(b120 > Decimal::ZERO);
    }

    #[test]
    fn test_months_to_amortize_inverts_annuity() {
        // Solving the term from the exact annuity payment recovers the term.
        let r = monthly_rate(dec!(3.5));
        for n in [12u32, 60, 120, 360] {
            let pmt = annuity_payment(dec!(800_000), r, n);
            let m = months_to_amortize(dec!(800_000), r, pmt).unwrap();
            assert!(
                m == n || m == n + 1,
                "inversion for n={}: got {}",
                n,
                m
            );
        }
    }

    #[test]
    fn test_months_to_amortize_zero_rate() {
        assert_eq!(
            months_to_amortize(dec!(10_000), Decimal::ZERO, dec!(1000)),
            Some(10)
        );
        assert_eq!(
            months_to_amortize(dec!(10_500), Decimal::ZERO, dec!(1000)),
            Some(11)
        );
    }

    #[test]
    fn test_months_to_amortize_unbounded() {
        // 1,000,000 at 0.5%/month accrues 5,000/month; 4,000 never retires it.
        let result = months_to_amortize(dec!(1_000_000), dec!(0.005), dec!(4000));
        assert_eq!(result, None);
    }

    #[test]
    fn test_months_to_amortize_zero_principal() {
        assert_eq!(
            months_to_amortize(Decimal::ZERO, dec!(0.005), dec!(1000)),
            Some(0)
        );
    }
}
