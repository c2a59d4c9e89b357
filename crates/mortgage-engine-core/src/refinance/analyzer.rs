//! Third-party refinance analysis.
//!
//! Evaluates replacing part of the original loan with a third-party loan at
//! a different rate, term, and accrual method. The original loan's
//! remaining principal is re-amortized over its remaining term at the
//! blended rate; the third-party leg is costed under either accrual
//! convention; the output is the monthly and lifetime delta.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::combined::{self, BaselinePlan};
use crate::amortization::schedule::BALANCE_EPSILON;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, LoanConfiguration, Money, Rate};
use crate::MortgageResult;

/// How the third-party loan accrues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualMethod {
    /// Standard annuity repayment.
    EqualInstallment,
    /// Monthly interest-only billing with the principal due in full at the
    /// payoff month.
    InterestFirst,
}

/// Proposed third-party refinance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceProposal {
    /// Requested amount; capped at the outstanding principal.
    pub amount: Money,
    pub new_annual_rate_percent: Rate,
    pub new_term_months: u32,
    pub accrual: AccrualMethod,
    /// Interest-first billing base; defaults to the refinanced amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_daily_balance: Option<Money>,
    /// Month the third-party principal is settled ahead of its term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_payoff_month: Option<u32>,
}

/// Top-level refinance analysis input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub configuration: LoanConfiguration,
    pub proposal: RefinanceProposal,
    /// Month the original loan state is read at; 0 is loan start.
    #[serde(default)]
    pub as_of_month: u32,
}

/// How the analysis resolved. `ZeroAmount` means nothing was refinanced
/// (requested amount or outstanding principal was zero) and no savings were
/// computed — distinct from an evaluated negative-savings result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefinanceOutcome {
    Evaluated,
    ZeroAmount,
}

/// Refinance comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub outcome: RefinanceOutcome,
    /// Amount moved to the third party after capping.
    pub refinance_amount: Money,
    /// Outstanding principal of the original loan at `as_of_month`.
    pub outstanding_principal: Money,
    pub remaining_months: u32,
    /// Principal-weighted rate the remaining original loan is re-amortized
    /// at, as a percentage.
    pub blended_annual_rate_percent: Rate,
    pub original_monthly_payment: Money,
    pub new_original_monthly_payment: Money,
    pub third_party_monthly_payment: Money,
    pub third_party_total_cost: Money,
    pub third_party_payoff_month: u32,
    /// Human-readable description of the third-party repayment convention.
    pub third_party_description: String,
    pub monthly_savings: Money,
    pub total_savings: Money,
    /// `total_savings > 0`.
    pub worth_it: bool,
}

/// Evaluate a third-party refinance proposal against a loan configuration.
pub fn analyze_refinance(
    input: &RefinanceInput,
) -> MortgageResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();

    let (plan, mut warnings) = combined::baseline_plan(&input.configuration)?;

    let methodology = match input.proposal.accrual {
        AccrualMethod::EqualInstallment => "Third-party refinance, equal-installment accrual",
        AccrualMethod::InterestFirst => "Third-party refinance, interest-first accrual",
    };

    let output = evaluate(&plan, input, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

fn evaluate(
    plan: &BaselinePlan,
    input: &RefinanceInput,
    warnings: &mut Vec<String>,
) -> RefinanceOutput {
    let as_of = input.as_of_month;
    if as_of >= plan.total_months {
        warnings.push(format!(
            "as_of_month {} is at or beyond the loan term of {} months",
            as_of, plan.total_months
        ));
    }

    let outstanding = plan.balance_after(as_of);
    let requested = input.proposal.amount.max(Decimal::ZERO);
    if requested != input.proposal.amount {
        warnings.push("negative refinance amount clamped to zero".into());
    }
    let refinance_amount = requested.min(outstanding);

    if refinance_amount <= BALANCE_EPSILON {
        warnings.push("nothing to refinance after capping at the outstanding principal".into());
        let terms = third_party_terms(&input.proposal, Decimal::ZERO, warnings);
        return RefinanceOutput {
            outcome: RefinanceOutcome::ZeroAmount,
            refinance_amount: Decimal::ZERO,
            outstanding_principal: outstanding,
            remaining_months: plan.total_months.saturating_sub(as_of),
            blended_annual_rate_percent: Decimal::ZERO,
            original_monthly_payment: Decimal::ZERO,
            new_original_monthly_payment: Decimal::ZERO,
            third_party_monthly_payment: Decimal::ZERO,
            third_party_total_cost: Decimal::ZERO,
            third_party_payoff_month: terms.payoff_month,
            third_party_description: terms.description,
            monthly_savings: Decimal::ZERO,
            total_savings: Decimal::ZERO,
            worth_it: false,
        };
    }

    let remaining_months = plan.total_months - as_of;

    // Rate the remaining original loan is re-amortized at: leg rates
    // weighted by outstanding balance.
    let weighted: Decimal = plan
        .legs
        .iter()
        .map(|(r, sched)| sched.balance_after(as_of) * r.leg.annual_rate_percent)
        .sum();
    let blended = weighted / outstanding;

    let remaining_original = outstanding - refinance_amount;
    let new_original_monthly = time_value::annuity_payment(
        remaining_original,
        time_value::monthly_rate(blended),
        remaining_months,
    );

    let original_monthly = plan
        .combined
        .get(as_of as usize)
        .map(|e| e.payment)
        .unwrap_or(Decimal::ZERO);
    let original_remaining_total: Decimal = plan
        .combined
        .iter()
        .skip(as_of as usize)
        .map(|e| e.payment)
        .sum();

    let terms = third_party_terms(&input.proposal, refinance_amount, warnings);

    let monthly_savings =
        original_monthly - (new_original_monthly + terms.monthly_payment);
    let total_savings = original_remaining_total
        - (new_original_monthly * Decimal::from(remaining_months) + terms.total_cost);

    RefinanceOutput {
        outcome: RefinanceOutcome::Evaluated,
        refinance_amount,
        outstanding_principal: outstanding,
        remaining_months,
        blended_annual_rate_percent: blended,
        original_monthly_payment: original_monthly,
        new_original_monthly_payment: new_original_monthly,
        third_party_monthly_payment: terms.monthly_payment,
        third_party_total_cost: terms.total_cost,
        third_party_payoff_month: terms.payoff_month,
        third_party_description: terms.description,
        monthly_savings,
        worth_it: total_savings > Decimal::ZERO,
        total_savings,
    }
}

struct ThirdPartyTerms {
    monthly_payment: Money,
    total_cost: Money,
    payoff_month: u32,
    description: String,
}

/// Cost the third-party leg under its accrual method.
fn third_party_terms(
    proposal: &RefinanceProposal,
    refinance_amount: Money,
    warnings: &mut Vec<String>,
) -> ThirdPartyTerms {
    let mut term = proposal.new_term_months;
    if term == 0 {
        warnings.push("third-party term of zero months clamped to 1".into());
        term = 1;
    }
    let rate_pct = proposal.new_annual_rate_percent.max(Decimal::ZERO);
    if rate_pct != proposal.new_annual_rate_percent {
        warnings.push("negative third-party rate clamped to zero".into());
    }

    let payoff_month = match proposal.target_payoff_month {
        None => term,
        Some(0) => {
            warnings.push("target payoff month of zero ignored; full term used".into());
            term
        }
        Some(k) if k > term => {
            warnings.push(format!(
                "target payoff month {} is beyond the {}-month term; full term used",
                k, term
            ));
            term
        }
        Some(k) => k,
    };

    match proposal.accrual {
        AccrualMethod::EqualInstallment => {
            let r = time_value::monthly_rate(rate_pct);
            let payment = time_value::annuity_payment(refinance_amount, r, term);
            let (total_cost, description) = if payoff_month < term {
                let balloon =
                    time_value::annuity_balance_after(refinance_amount, r, payment, payoff_month);
                (
                    payment * Decimal::from(payoff_month) + balloon,
                    format!(
                        "Equal monthly installments over {} months, with the outstanding \
                         balance settled as a lump sum at month {}",
                        term, payoff_month
                    ),
                )
            } else {
                (
                    payment * Decimal::from(term),
                    format!("Equal monthly installments over {} months", term),
                )
            };
            ThirdPartyTerms {
                monthly_payment: payment,
                total_cost,
                payoff_month,
                description,
            }
        }
        AccrualMethod::InterestFirst => {
            let base = proposal
                .average_daily_balance
                .filter(|b| *b > Decimal::ZERO)
                .unwrap_or(refinance_amount);
            // 30/360 billing: one month of interest is 30 days at the
            // daily rate.
            let daily_rate = rate_pct / dec!(36000);
            let monthly_interest = base * daily_rate * dec!(30);
            ThirdPartyTerms {
                monthly_payment: monthly_interest,
                total_cost: monthly_interest * Decimal::from(payoff_month) + refinance_amount,
                payoff_month,
                description: format!(
                    "Monthly interest-only billing at 30 days of the daily rate, \
                     principal due in full at month {}",
                    payoff_month
                ),
            }
        }
    }
}
