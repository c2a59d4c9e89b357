use clap::Args;
use serde_json::Value;

use mortgage_engine_core::prepayment::simulator::{self, PrepaymentInput};

use crate::input;

#[derive(Args)]
pub struct PrepayArgs {
    /// Path to a JSON or YAML prepayment input (configuration + event)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_prepay(args: PrepayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pp_input: PrepaymentInput = if let Some(ref path) = args.input {
        input::file::read(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json|file.yaml> or stdin required for prepayment simulation".into());
    };
    let result = simulator::simulate_prepayment(&pp_input)?;
    Ok(serde_json::to_value(result)?)
}
