use clap::Args;
use serde_json::Value;

use mortgage_engine_core::refinance::analyzer::{self, RefinanceInput};

use crate::input;

#[derive(Args)]
pub struct RefinanceArgs {
    /// Path to a JSON or YAML refinance input (configuration + proposal)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rf_input: RefinanceInput = if let Some(ref path) = args.input {
        input::file::read(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json|file.yaml> or stdin required for refinance analysis".into());
    };
    let result = analyzer::analyze_refinance(&rf_input)?;
    Ok(serde_json::to_value(result)?)
}
