//! Combined-loan aggregation and the top-level plan computation.
//!
//! A combined loan is two independently-amortizing legs; the merged
//! schedule is their element-wise sum and is the baseline every projection
//! (prepayment, refinance) consumes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{self, LegSchedule};
use crate::amortization::summary::{self, ScheduleSummary};
use crate::error::MortgageError;
use crate::types::{
    with_metadata, ComputationOutput, LegRole, LoanConfiguration, LoanKind, LoanLeg, Money,
    ScheduleEntry,
};
use crate::MortgageResult;

/// A leg selected and sanitized for one calculation pass.
#[derive(Debug, Clone)]
pub struct ResolvedLeg {
    pub role: LegRole,
    pub leg: LoanLeg,
}

/// Base amortization state shared by the projection modules.
#[derive(Debug, Clone)]
pub struct BaselinePlan {
    pub legs: Vec<(ResolvedLeg, LegSchedule)>,
    pub combined: Vec<ScheduleEntry>,
    pub total_months: u32,
}

impl BaselinePlan {
    /// Combined outstanding balance right after the payment of `month`.
    pub fn balance_after(&self, month: u32) -> Money {
        self.legs
            .iter()
            .map(|(_, sched)| sched.balance_after(month))
            .sum()
    }

    /// Sum of scheduled payments for months `1..=month`.
    pub fn payments_through(&self, month: u32) -> Money {
        self.combined
            .iter()
            .take(month as usize)
            .map(|e| e.payment)
            .sum()
    }

    /// Total scheduled payment over the whole loan.
    pub fn total_payment(&self) -> Money {
        self.legs.iter().map(|(_, sched)| sched.total_payment).sum()
    }
}

/// Element-wise sum of two schedules; the shorter side counts as zero.
/// Month numbers and dates come from whichever input covers the row.
pub fn merge_schedules(a: &[ScheduleEntry], b: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
    let len = a.len().max(b.len());
    let mut merged = Vec::with_capacity(len);

    for i in 0..len {
        let ea = a.get(i);
        let eb = b.get(i);
        let sum = |field: fn(&ScheduleEntry) -> Money| -> Money {
            ea.map(field).unwrap_or(Decimal::ZERO) + eb.map(field).unwrap_or(Decimal::ZERO)
        };
        merged.push(ScheduleEntry {
            month: ea.or(eb).map(|e| e.month).unwrap_or(i as u32 + 1),
            payment: sum(|e| e.payment),
            principal_portion: sum(|e| e.principal_portion),
            interest_portion: sum(|e| e.interest_portion),
            remaining_balance: sum(|e| e.remaining_balance),
            date: ea.and_then(|e| e.date).or_else(|| eb.and_then(|e| e.date)),
        });
    }

    merged
}

/// Select and sanitize the legs the configuration's kind calls for.
///
/// Deserialized session data may be stale: a leg the kind requires but the
/// data lacks degrades to nothing with a warning, and a leg the kind
/// excludes is ignored with a warning. Only a configuration with no usable
/// leg at all is an error.
pub fn resolve_legs(
    config: &LoanConfiguration,
) -> MortgageResult<(Vec<ResolvedLeg>, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();

    match config.kind {
        LoanKind::Commercial => {
            if config.commercial.is_none() {
                warnings.push("kind is Commercial but no commercial leg supplied".into());
            }
            if config.housing_fund.is_some() {
                warnings.push("housing fund leg ignored for kind Commercial".into());
            }
        }
        LoanKind::HousingFund => {
            if config.housing_fund.is_none() {
                warnings.push("kind is HousingFund but no housing fund leg supplied".into());
            }
            if config.commercial.is_some() {
                warnings.push("commercial leg ignored for kind HousingFund".into());
            }
        }
        LoanKind::Combined => {
            if config.commercial.is_none() {
                warnings.push("kind is Combined but the commercial leg is missing".into());
            }
            if config.housing_fund.is_none() {
                warnings.push("kind is Combined but the housing fund leg is missing".into());
            }
        }
    }

    let mut resolved = Vec::with_capacity(2);
    for (role, leg) in config.active_legs() {
        let sanitized = leg.sanitized();
        if sanitized.principal != leg.principal
            || sanitized.annual_rate_percent != leg.annual_rate_percent
        {
            warnings.push(format!("{:?} leg has negative inputs; clamped to zero", role));
        }
        resolved.push(ResolvedLeg {
            role,
            leg: sanitized,
        });
    }

    if resolved.is_empty() {
        return Err(MortgageError::InvalidInput {
            field: "configuration".into(),
            reason: "no loan leg supplied for the declared kind".into(),
        });
    }

    Ok((resolved, warnings))
}

/// Amortize every active leg and merge. This is the snapshot the
/// projection modules evaluate against.
pub fn baseline_plan(
    config: &LoanConfiguration,
) -> MortgageResult<(BaselinePlan, Vec<String>)> {
    let (resolved, warnings) = resolve_legs(config)?;

    let mut combined: Vec<ScheduleEntry> = Vec::new();
    let mut legs = Vec::with_capacity(resolved.len());
    for r in resolved {
        let sched = schedule::leg_schedule(&r.leg, 0);
        combined = merge_schedules(&combined, &sched.entries);
        legs.push((r, sched));
    }
    let total_months = combined.len() as u32;

    Ok((
        BaselinePlan {
            legs,
            combined,
            total_months,
        },
        warnings,
    ))
}

/// Full plan for a loan configuration: per-leg schedules, the merged
/// schedule, and its summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPlanOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commercial: Option<LegSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing_fund: Option<LegSchedule>,
    pub schedule: Vec<ScheduleEntry>,
    pub summary: ScheduleSummary,
}

/// Compute the baseline amortization plan for a configuration.
pub fn compute_plan(
    config: &LoanConfiguration,
) -> MortgageResult<ComputationOutput<LoanPlanOutput>> {
    let start = Instant::now();

    let (mut plan, warnings) = baseline_plan(config)?;

    if let Some(first) = config.first_payment_date {
        schedule::attach_dates(&mut plan.combined, first);
        for (_, sched) in plan.legs.iter_mut() {
            schedule::attach_dates(&mut sched.entries, first);
        }
    }

    let summary = summary::summarize(&plan.combined);

    let mut commercial = None;
    let mut housing_fund = None;
    for (r, sched) in plan.legs {
        match r.role {
            LegRole::Commercial => commercial = Some(sched),
            LegRole::HousingFund => housing_fund = Some(sched),
        }
    }

    let methodology = match config.kind {
        LoanKind::Combined => "Combined two-leg amortization plan",
        _ => "Single-leg amortization plan",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        config,
        warnings,
        elapsed,
        LoanPlanOutput {
            commercial,
            housing_fund,
            schedule: plan.combined,
            summary,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepaymentMethod;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn commercial_leg() -> LoanLeg {
        LoanLeg {
            principal: dec!(600_000),
            annual_rate_percent: dec!(4.0),
            term_months: 360,
            method: RepaymentMethod::EqualInstallment,
        }
    }

    fn fund_leg() -> LoanLeg {
        LoanLeg {
            principal: dec!(400_000),
            annual_rate_percent: dec!(3.0),
            term_months: 240,
            method: RepaymentMethod::EqualInstallment,
        }
    }

    fn combined_config() -> LoanConfiguration {
        LoanConfiguration {
            kind: LoanKind::Combined,
            commercial: Some(commercial_leg()),
            housing_fund: Some(fund_leg()),
            first_payment_date: None,
        }
    }

    // -----------------------------------------------------------------------
    // 1. Merge linearity: every row is the element-wise sum
    // -----------------------------------------------------------------------
    #[test]
    fn test_merge_linearity() {
        let a = schedule::leg_schedule(&commercial_leg(), 0);
        let b = schedule::leg_schedule(&fund_leg(), 0);
        let merged = merge_schedules(&a.entries, &b.entries);

        assert_eq!(merged.len(), 360);
        for (i, entry) in merged.iter().enumerate() {
            let pa = a.entries.get(i).map(|e| e.payment).unwrap_or_default();
            let pb = b.entries.get(i).map(|e| e.payment).unwrap_or_default();
            assert!(
                (entry.payment - (pa + pb)).abs() < dec!(0.001),
                "month {}: merged payment is not the sum",
                i + 1
            );
        }
    }

    // -----------------------------------------------------------------------
    // 2. Merge with one side empty is the identity
    // -----------------------------------------------------------------------
    #[test]
    fn test_merge_with_empty() {
        let a = schedule::leg_schedule(&fund_leg(), 0);
        let merged = merge_schedules(&a.entries, &[]);
        assert_eq!(merged.len(), a.entries.len());
        assert_eq!(merged[0].payment, a.entries[0].payment);
    }

    // -----------------------------------------------------------------------
    // 3. Shorter leg contributes zero past its end
    // -----------------------------------------------------------------------
    #[test]
    fn test_merge_past_shorter_leg() {
        let a = schedule::leg_schedule(&commercial_leg(), 0);
        let b = schedule::leg_schedule(&fund_leg(), 0);
        let merged = merge_schedules(&a.entries, &b.entries);

        // Month 300 is past the 240-month fund leg.
        let idx = 299;
        assert!((merged[idx].payment - a.entries[idx].payment).abs() < dec!(0.001));
    }

    // -----------------------------------------------------------------------
    // 4. compute_plan: combined output wiring
    // -----------------------------------------------------------------------
    #[test]
    fn test_compute_plan_combined() {
        let output = compute_plan(&combined_config()).unwrap();
        let plan = output.result;

        assert!(plan.commercial.is_some());
        assert!(plan.housing_fund.is_some());
        assert_eq!(plan.schedule.len(), 360);
        assert!(output.warnings.is_empty());
        assert!(output.methodology.contains("Combined"));

        // First payment is the sum of the two leg payments.
        let c = plan.commercial.as_ref().unwrap().entries[0].payment;
        let f = plan.housing_fund.as_ref().unwrap().entries[0].payment;
        assert!((plan.summary.first_monthly_payment - (c + f)).abs() < dec!(0.001));
    }

    // -----------------------------------------------------------------------
    // 5. compute_plan: missing leg degrades with a warning
    // -----------------------------------------------------------------------
    #[test]
    fn test_compute_plan_missing_fund_leg() {
        let config = LoanConfiguration {
            kind: LoanKind::Combined,
            commercial: Some(commercial_leg()),
            housing_fund: None,
            first_payment_date: None,
        };
        let output = compute_plan(&config).unwrap();
        assert!(!output.warnings.is_empty());
        assert_eq!(output.result.schedule.len(), 360);
        assert!(output.result.housing_fund.is_none());
    }

    // -----------------------------------------------------------------------
    // 6. compute_plan: no usable leg is an error
    // -----------------------------------------------------------------------
    #[test]
    fn test_compute_plan_no_legs() {
        let config = LoanConfiguration {
            kind: LoanKind::Combined,
            commercial: None,
            housing_fund: None,
            first_payment_date: None,
        };
        assert!(compute_plan(&config).is_err());
    }

    // -----------------------------------------------------------------------
    // 7. Leg excluded by the kind is ignored with a warning
    // -----------------------------------------------------------------------
    #[test]
    fn test_resolve_legs_ignores_excluded() {
        let config = LoanConfiguration {
            kind: LoanKind::Commercial,
            commercial: Some(commercial_leg()),
            housing_fund: Some(fund_leg()),
            first_payment_date: None,
        };
        let (resolved, warnings) = resolve_legs(&config).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].role, LegRole::Commercial);
        assert_eq!(warnings.len(), 1);
    }

    // -----------------------------------------------------------------------
    // 8. Dates are attached to merged and per-leg rows
    // -----------------------------------------------------------------------
    #[test]
    fn test_compute_plan_dates() {
        let mut config = combined_config();
        config.first_payment_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        let output = compute_plan(&config).unwrap();

        let first = output.result.schedule.first().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2026, 9, 1));
        let last = output.result.schedule.last().unwrap();
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2056, 8, 1));
    }

    // -----------------------------------------------------------------------
    // 9. Baseline helpers: balances and payment prefix sums
    // -----------------------------------------------------------------------
    #[test]
    fn test_baseline_helpers() {
        let (plan, _) = baseline_plan(&combined_config()).unwrap();

        assert_eq!(plan.total_months, 360);
        assert_eq!(plan.balance_after(0), dec!(1_000_000));
        assert!(plan.balance_after(120) < plan.balance_after(60));

        let first_two: Decimal = plan.combined.iter().take(2).map(|e| e.payment).sum();
        assert_eq!(plan.payments_through(2), first_two);
    }
}
