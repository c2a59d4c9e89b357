use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_loan_plan(input_json: String) -> NapiResult<String> {
    let config: mortgage_engine_core::types::LoanConfiguration =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage_engine_core::amortization::combined::compute_plan(&config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Prepayment
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_prepayment(input_json: String) -> NapiResult<String> {
    let input: mortgage_engine_core::prepayment::simulator::PrepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage_engine_core::prepayment::simulator::simulate_prepayment(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Refinance
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_refinance(input_json: String) -> NapiResult<String> {
    let input: mortgage_engine_core::refinance::analyzer::RefinanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage_engine_core::refinance::analyzer::analyze_refinance(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
