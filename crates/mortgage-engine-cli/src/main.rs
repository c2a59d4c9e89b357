mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::prepayment::PrepayArgs;
use commands::refinance::RefinanceArgs;
use commands::schedule::ScheduleArgs;

/// Loan amortization, prepayment, and refinance calculations
#[derive(Parser)]
#[command(
    name = "mtg",
    version,
    about = "Loan amortization, prepayment, and refinance calculations",
    long_about = "A CLI for amortization schedules with decimal precision. \
                  Supports equal-installment and equal-principal repayment, \
                  combined commercial plus housing-fund loans, lump-sum \
                  prepayment projections, and third-party refinance analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the amortization schedule for a loan configuration
    Schedule(ScheduleArgs),
    /// Simulate a lump-sum prepayment (reduce payment or shorten term)
    Prepay(PrepayArgs),
    /// Evaluate a third-party refinance proposal
    Refinance(RefinanceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Prepay(args) => commands::prepayment::run_prepay(args),
        Commands::Refinance(args) => commands::refinance::run_refinance(args),
        Commands::Version => {
            println!("mtg {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
