use clap::Args;
use serde_json::Value;

use cashflow_lab_core::scenario::{self, ScenarioKind};

use crate::commands::{self, BusinessArgs};

/// Arguments for scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub business: BusinessArgs,

    /// Scenario to run, repeatable: base, conservative, aggressive.
    /// Defaults to all three
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Custom scenario: receivable days (needs the other two custom flags)
    #[arg(long)]
    pub custom_ar_days: Option<u32>,

    /// Custom scenario: payable days
    #[arg(long)]
    pub custom_ap_days: Option<u32>,

    /// Custom scenario: inventory days
    #[arg(long)]
    pub custom_inventory_days: Option<u32>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let run = commands::resolve_run(&args.business)?;

    let mut kinds = commands::parse_scenarios(&args.scenarios)?;

    match (
        args.custom_ar_days,
        args.custom_ap_days,
        args.custom_inventory_days,
    ) {
        (None, None, None) => {}
        (Some(ar_days), Some(ap_days), Some(inventory_days)) => {
            kinds.push(ScenarioKind::Custom {
                ar_days,
                ap_days,
                inventory_days,
            });
        }
        _ => {
            return Err(
                "--custom-ar-days, --custom-ap-days, and --custom-inventory-days must be \
                 provided together"
                    .into(),
            )
        }
    }

    if kinds.is_empty() {
        kinds = vec![
            ScenarioKind::Base,
            ScenarioKind::Conservative,
            ScenarioKind::Aggressive,
        ];
    }

    let result =
        scenario::compare_scenarios(&run.inputs, run.num_months, run.debt.as_ref(), &kinds)?;
    Ok(serde_json::to_value(result)?)
}
