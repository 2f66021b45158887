use clap::Args;
use serde_json::Value;

use cashflow_lab_core::projection;

use crate::commands::{self, BusinessArgs};

/// Arguments for a single projection run
#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub business: BusinessArgs,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let run = commands::resolve_run(&args.business)?;

    let result =
        projection::build_monthly_projection(&run.inputs, run.num_months, run.debt.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
