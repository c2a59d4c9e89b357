//! Prepayment projections.
//!
//! A lump-sum prepayment at a given month is simulated under one of two
//! strategies: hold the term and lower the payment, or hold the payment and
//! shorten the term. The simulation evaluates against a snapshot of the
//! baseline plan and produces an independent tail projection; the baseline
//! is never mutated.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::combined::{self, BaselinePlan};
use crate::amortization::schedule::{leg_schedule, BALANCE_EPSILON};
use crate::time_value;
use crate::types::{
    with_metadata, ComputationOutput, LoanConfiguration, LoanLeg, Money, Rate, RepaymentMethod,
    ScheduleEntry,
};
use crate::MortgageResult;

/// Which lever the borrower pulls after a lump-sum prepayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentStrategy {
    /// Keep the remaining term, lower the monthly payment.
    ReducePayment,
    /// Keep the monthly payment, retire the loan earlier.
    ShortenTerm,
}

/// A lump-sum prepayment applied right after the scheduled payment of
/// `at_month`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentEvent {
    pub amount: Money,
    pub at_month: u32,
    pub strategy: PrepaymentStrategy,
}

/// Top-level prepayment simulation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentInput {
    pub configuration: LoanConfiguration,
    pub event: PrepaymentEvent,
}

/// How the simulation resolved. Callers must check this before reading the
/// projection fields; outside `Recomputed`/`FullPayoff` they are zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentOutcome {
    /// Tail recomputed under the requested strategy.
    Recomputed,
    /// `at_month` does not fall inside the repayment window, or nothing is
    /// outstanding there.
    NotApplicable,
    /// The amount covers the whole outstanding balance at `at_month`.
    FullPayoff,
    /// Shorten-term only: the held payment cannot retire the reduced
    /// principal.
    UnboundedTerm,
}

/// Prepayment projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentOutput {
    pub outcome: PrepaymentOutcome,
    pub strategy: PrepaymentStrategy,
    pub at_month: u32,
    /// Amount actually applied, capped at the outstanding balance.
    pub amount_applied: Money,
    /// Combined outstanding balance right after the `at_month` payment.
    pub outstanding_before: Money,
    /// Scheduled payments over months `1..=at_month`.
    pub payments_before: Money,
    /// Recomputed months `at_month+1 ..`; empty on full payoff.
    pub tail_schedule: Vec<ScheduleEntry>,
    /// Payments before + amount applied + tail payments.
    pub new_total_payment: Money,
    pub interest_saved: Money,
    /// Combined payment of the first tail month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_monthly_payment: Option<Money>,
    /// Shorten-term: total loan term after shortening.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_saved: Option<u32>,
}

/// Simulate a prepayment event against a loan configuration.
pub fn simulate_prepayment(
    input: &PrepaymentInput,
) -> MortgageResult<ComputationOutput<PrepaymentOutput>> {
    let start = Instant::now();

    let (plan, mut warnings) = combined::baseline_plan(&input.configuration)?;

    let amount = input.event.amount.max(Decimal::ZERO);
    if amount != input.event.amount {
        warnings.push("negative prepayment amount clamped to zero".into());
    }

    let methodology = match input.event.strategy {
        PrepaymentStrategy::ReducePayment => {
            "Prepayment: reduced monthly payment over the held remaining term"
        }
        PrepaymentStrategy::ShortenTerm => {
            "Prepayment: held monthly payment over a shortened term"
        }
    };

    let output = run_simulation(&plan, amount, &input.event, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

fn run_simulation(
    plan: &BaselinePlan,
    amount: Money,
    event: &PrepaymentEvent,
    warnings: &mut Vec<String>,
) -> PrepaymentOutput {
    let at = event.at_month;

    if at == 0 || at >= plan.total_months {
        warnings.push(format!(
            "prepayment month {} is outside the repayment window (1..{})",
            at, plan.total_months
        ));
        return degenerate(PrepaymentOutcome::NotApplicable, event);
    }

    let outstanding = plan.balance_after(at);
    if outstanding <= BALANCE_EPSILON {
        warnings.push(format!("nothing outstanding at month {}", at));
        return degenerate(PrepaymentOutcome::NotApplicable, event);
    }

    let payments_before = plan.payments_through(at);
    let original_total = plan.total_payment();

    if amount + BALANCE_EPSILON >= outstanding {
        // The prepayment extinguishes the loan at `at_month`; the savings
        // are all remaining scheduled interest.
        let new_total = payments_before + outstanding;
        return PrepaymentOutput {
            outcome: PrepaymentOutcome::FullPayoff,
            strategy: event.strategy,
            at_month: at,
            amount_applied: outstanding,
            outstanding_before: outstanding,
            payments_before,
            tail_schedule: Vec::new(),
            new_total_payment: new_total,
            interest_saved: original_total - new_total,
            new_monthly_payment: None,
            new_term_months: Some(at),
            months_saved: Some(plan.total_months - at),
        };
    }

    match event.strategy {
        PrepaymentStrategy::ReducePayment => {
            reduce_payment(plan, amount, at, outstanding, payments_before, original_total)
        }
        PrepaymentStrategy::ShortenTerm => shorten_term(
            plan,
            amount,
            at,
            outstanding,
            payments_before,
            original_total,
            warnings,
        ),
    }
}

/// All-zero output for the flagged outcomes.
fn degenerate(outcome: PrepaymentOutcome, event: &PrepaymentEvent) -> PrepaymentOutput {
    PrepaymentOutput {
        outcome,
        strategy: event.strategy,
        at_month: event.at_month,
        amount_applied: Decimal::ZERO,
        outstanding_before: Decimal::ZERO,
        payments_before: Decimal::ZERO,
        tail_schedule: Vec::new(),
        new_total_payment: Decimal::ZERO,
        interest_saved: Decimal::ZERO,
        new_monthly_payment: None,
        new_term_months: None,
        months_saved: None,
    }
}

/// Hold each leg's remaining term; solve a new annuity payment on the
/// reduced principal. The prepayment is split across legs proportionally to
/// their outstanding balances.
fn reduce_payment(
    plan: &BaselinePlan,
    amount: Money,
    at: u32,
    outstanding: Money,
    payments_before: Money,
    original_total: Money,
) -> PrepaymentOutput {
    let mut tail: Vec<ScheduleEntry> = Vec::new();
    let mut applied = Decimal::ZERO;

    for (resolved, sched) in &plan.legs {
        let balance = sched.balance_after(at);
        if balance <= BALANCE_EPSILON {
            continue;
        }
        let remaining = resolved.leg.term_months.saturating_sub(at);
        if remaining == 0 {
            continue;
        }

        let alloc = amount * balance / outstanding;
        applied += alloc;
        let reduced = (balance - alloc).max(Decimal::ZERO);

        // The tail is re-amortized as an annuity over the held remaining
        // term regardless of the leg's original convention.
        let tail_leg = LoanLeg {
            principal: reduced,
            annual_rate_percent: resolved.leg.annual_rate_percent,
            term_months: remaining,
            method: RepaymentMethod::EqualInstallment,
        };
        let leg_tail = leg_schedule(&tail_leg, at);
        tail = combined::merge_schedules(&tail, &leg_tail.entries);
    }

    let new_tail_total: Decimal = tail.iter().map(|e| e.payment).sum();
    let new_total = payments_before + applied + new_tail_total;

    PrepaymentOutput {
        outcome: PrepaymentOutcome::Recomputed,
        strategy: PrepaymentStrategy::ReducePayment,
        at_month: at,
        amount_applied: applied,
        outstanding_before: outstanding,
        payments_before,
        new_monthly_payment: tail.first().map(|e| e.payment),
        tail_schedule: tail,
        new_total_payment: new_total,
        interest_saved: original_total - new_total,
        new_term_months: None,
        months_saved: None,
    }
}

/// Hold each leg's pre-prepayment payment; solve the shortened term. The
/// combined tail runs until the slowest leg retires, and a leg that retires
/// earlier contributes nothing to the later months.
fn shorten_term(
    plan: &BaselinePlan,
    amount: Money,
    at: u32,
    outstanding: Money,
    payments_before: Money,
    original_total: Money,
    warnings: &mut Vec<String>,
) -> PrepaymentOutput {
    let mut tail: Vec<ScheduleEntry> = Vec::new();
    let mut applied = Decimal::ZERO;

    for (resolved, sched) in &plan.legs {
        let balance = sched.balance_after(at);
        if balance <= BALANCE_EPSILON {
            continue;
        }

        let alloc = amount * balance / outstanding;
        applied += alloc;
        let reduced = (balance - alloc).max(Decimal::ZERO);
        if reduced <= BALANCE_EPSILON {
            // This leg is retired by the prepayment itself.
            continue;
        }

        let rate = resolved.leg.monthly_rate();
        let leg_tail = match resolved.leg.method {
            RepaymentMethod::EqualInstallment => {
                let held = sched.entries.first().map(|e| e.payment).unwrap_or(Decimal::ZERO);
                match time_value::months_to_amortize(reduced, rate, held) {
                    Some(months) => annuity_tail(reduced, rate, held, months, at),
                    None => {
                        warnings.push(format!(
                            "held payment cannot retire the reduced {:?} principal",
                            resolved.role
                        ));
                        let event = PrepaymentEvent {
                            amount,
                            at_month: at,
                            strategy: PrepaymentStrategy::ShortenTerm,
                        };
                        return degenerate(PrepaymentOutcome::UnboundedTerm, &event);
                    }
                }
            }
            RepaymentMethod::EqualPrincipal => {
                let portion = sched
                    .entries
                    .first()
                    .map(|e| e.principal_portion)
                    .unwrap_or(Decimal::ZERO);
                match equal_principal_months(reduced, portion) {
                    Some(months) => equal_principal_tail(reduced, rate, portion, months, at),
                    None => {
                        warnings.push(format!(
                            "held principal portion cannot retire the reduced {:?} principal",
                            resolved.role
                        ));
                        let event = PrepaymentEvent {
                            amount,
                            at_month: at,
                            strategy: PrepaymentStrategy::ShortenTerm,
                        };
                        return degenerate(PrepaymentOutcome::UnboundedTerm, &event);
                    }
                }
            }
        };
        tail = combined::merge_schedules(&tail, &leg_tail);
    }

    let tail_months = tail.len() as u32;
    let remaining = plan.total_months - at;
    let new_tail_total: Decimal = tail.iter().map(|e| e.payment).sum();
    let new_total = payments_before + applied + new_tail_total;

    PrepaymentOutput {
        outcome: PrepaymentOutcome::Recomputed,
        strategy: PrepaymentStrategy::ShortenTerm,
        at_month: at,
        amount_applied: applied,
        outstanding_before: outstanding,
        payments_before,
        new_monthly_payment: tail.first().map(|e| e.payment),
        tail_schedule: tail,
        new_total_payment: new_total,
        interest_saved: original_total - new_total,
        new_term_months: Some(at + tail_months),
        months_saved: Some(remaining.saturating_sub(tail_months)),
    }
}

/// Months for a fixed principal portion to retire the balance.
fn equal_principal_months(reduced: Money, portion: Money) -> Option<u32> {
    if portion <= Decimal::ZERO {
        return None;
    }
    (reduced / portion).ceil().to_u32()
}

/// Generate an annuity tail with the payment held; the final month carries
/// the residual.
fn annuity_tail(
    principal: Money,
    rate: Rate,
    payment: Money,
    months: u32,
    offset: u32,
) -> Vec<ScheduleEntry> {
    let mut entries = Vec::with_capacity(months as usize);
    let mut balance = principal;

    for i in 1..=months {
        if balance <= Decimal::ZERO {
            break;
        }
        let interest = balance * rate;
        let principal_portion = (payment - interest).min(balance);
        let paid = principal_portion + interest;
        balance = (balance - principal_portion).max(Decimal::ZERO);
        entries.push(ScheduleEntry {
            month: offset + i,
            payment: paid,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            date: None,
        });
    }

    entries
}

/// Generate an equal-principal tail with the principal portion held.
fn equal_principal_tail(
    principal: Money,
    rate: Rate,
    portion: Money,
    months: u32,
    offset: u32,
) -> Vec<ScheduleEntry> {
    let mut entries = Vec::with_capacity(months as usize);
    let mut balance = principal;

    for i in 1..=months {
        if balance <= Decimal::ZERO {
            break;
        }
        let principal_portion = portion.min(balance);
        let interest = balance * rate;
        balance = (balance - principal_portion).max(Decimal::ZERO);
        entries.push(ScheduleEntry {
            month: offset + i,
            payment: principal_portion + interest,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            date: None,
        });
    }

    entries
}
