use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cashflow_lab_core::scenario::{self, DEFAULT_GROWTH_RATES};

use crate::commands::{self, BusinessArgs};

/// Arguments for growth capacity analysis
#[derive(Args)]
pub struct GrowthArgs {
    #[command(flatten)]
    pub business: BusinessArgs,

    /// Candidate monthly growth rate, repeatable (e.g. --rate 0.05).
    /// Defaults to the standard grid from 0% to 15%
    #[arg(long = "rate", allow_hyphen_values = true)]
    pub rates: Vec<Decimal>,
}

pub fn run_growth(args: GrowthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let run = commands::resolve_run(&args.business)?;

    let rates = if args.rates.is_empty() {
        DEFAULT_GROWTH_RATES.to_vec()
    } else {
        args.rates.clone()
    };

    let result = scenario::analyze_growth_capacity(
        &run.inputs,
        run.num_months,
        run.debt.as_ref(),
        &rates,
    )?;
    Ok(serde_json::to_value(result)?)
}
