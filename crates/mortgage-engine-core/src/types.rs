use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual rates expressed as percentages (3.5 = 3.5%). The monthly rate is
/// `annual_rate_percent / 100 / 12`.
pub type Rate = Decimal;

/// Repayment convention for a single loan leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// Fixed total payment every month (annuity); interest portion declines,
    /// principal portion grows.
    EqualInstallment,
    /// Fixed principal portion every month; total payment declines as
    /// interest shrinks.
    EqualPrincipal,
}

/// Which legs a loan is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanKind {
    Commercial,
    HousingFund,
    Combined,
}

/// Identifies a leg within a combined loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegRole {
    Commercial,
    HousingFund,
}

/// One independently-amortizing loan leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanLeg {
    pub principal: Money,
    /// Annual rate as a percentage (3.5 = 3.5%/yr).
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    pub method: RepaymentMethod,
}

impl LoanLeg {
    /// Copy with negative principal/rate clamped to zero. Deserialized
    /// session data may carry garbage; the engine computes on zeros instead
    /// of erroring.
    pub fn sanitized(&self) -> LoanLeg {
        LoanLeg {
            principal: self.principal.max(Decimal::ZERO),
            annual_rate_percent: self.annual_rate_percent.max(Decimal::ZERO),
            term_months: self.term_months,
            method: self.method,
        }
    }

    /// Monthly rate as a decimal fraction.
    pub fn monthly_rate(&self) -> Rate {
        crate::time_value::monthly_rate(self.annual_rate_percent)
    }
}

/// One row of an amortization schedule. `payment = principal_portion +
/// interest_portion` within rounding; `remaining_balance` is non-increasing
/// and clamped at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based month number.
    pub month: u32,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
    /// Calendar date of the payment, when the configuration carries a
    /// first payment date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Full loan description as supplied by the caller. Immutable for the
/// duration of one calculation pass; projections snapshot it and never
/// mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanConfiguration {
    pub kind: LoanKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commercial: Option<LoanLeg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing_fund: Option<LoanLeg>,
    /// Optional date of the first monthly payment, used to label schedule
    /// rows with calendar dates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanConfiguration {
    /// The legs the declared kind calls for, in (role, leg) pairs. Legs
    /// supplied but excluded by the kind are not returned.
    pub fn active_legs(&self) -> Vec<(LegRole, &LoanLeg)> {
        let mut legs = Vec::with_capacity(2);
        if matches!(self.kind, LoanKind::Commercial | LoanKind::Combined) {
            if let Some(ref leg) = self.commercial {
                legs.push((LegRole::Commercial, leg));
            }
        }
        if matches!(self.kind, LoanKind::HousingFund | LoanKind::Combined) {
            if let Some(ref leg) = self.housing_fund {
                legs.push((LegRole::HousingFund, leg));
            }
        }
        legs
    }

    /// Total sanitized principal across active legs.
    pub fn total_principal(&self) -> Money {
        self.active_legs()
            .iter()
            .map(|(_, leg)| leg.sanitized().principal)
            .sum()
    }

    /// Longest active leg term; the combined schedule has this many months.
    pub fn total_term_months(&self) -> u32 {
        self.active_legs()
            .iter()
            .map(|(_, leg)| leg.term_months)
            .max()
            .unwrap_or(0)
    }

    /// Principal-weighted average of the leg rates, as a percentage.
    pub fn blended_annual_rate_percent(&self) -> Rate {
        let total = self.total_principal();
        if total.is_zero() {
            return Decimal::ZERO;
        }
        let weighted: Decimal = self
            .active_legs()
            .iter()
            .map(|(_, leg)| {
                let s = leg.sanitized();
                s.principal * s.annual_rate_percent
            })
            .sum();
        weighted / total
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
