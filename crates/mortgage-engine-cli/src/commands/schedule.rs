use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_engine_core::amortization::combined;
use mortgage_engine_core::types::{LoanConfiguration, LoanKind, LoanLeg, RepaymentMethod};

use crate::input;

/// Arguments for schedule computation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a percentage (3.5 = 3.5%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Repayment method
    #[arg(long, value_enum, default_value = "equal-installment")]
    pub method: MethodArg,

    /// Path to a JSON or YAML loan configuration (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum MethodArg {
    EqualInstallment,
    EqualPrincipal,
}

impl From<MethodArg> for RepaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::EqualInstallment => RepaymentMethod::EqualInstallment,
            MethodArg::EqualPrincipal => RepaymentMethod::EqualPrincipal,
        }
    }
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: LoanConfiguration = if let Some(ref path) = args.input {
        input::file::read(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        // Individual flags describe a single commercial leg.
        LoanConfiguration {
            kind: LoanKind::Commercial,
            commercial: Some(LoanLeg {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args
                    .annual_rate
                    .ok_or("--annual-rate is required (or provide --input)")?,
                term_months: args
                    .term_months
                    .ok_or("--term-months is required (or provide --input)")?,
                method: args.method.into(),
            }),
            housing_fund: None,
            first_payment_date: None,
        }
    };

    let result = combined::compute_plan(&config)?;
    Ok(serde_json::to_value(result)?)
}
