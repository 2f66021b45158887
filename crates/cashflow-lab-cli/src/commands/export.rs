use chrono::Local;
use clap::Args;
use serde_json::Value;
use std::fs::File;

use cashflow_lab_core::scenario::{self, ScenarioKind};

use crate::commands::{self, BusinessArgs};

/// Arguments for CSV export
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub business: BusinessArgs,

    /// Scenario to include, repeatable: base, conservative, aggressive.
    /// Defaults to all three
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Destination path. Defaults to cash_flow_projections_<timestamp>.csv
    #[arg(long)]
    pub out: Option<String>,
}

/// Exported column order, scenario label first then the month fields.
const COLUMNS: [&str; 27] = [
    "month",
    "revenue",
    "cogs",
    "ebit",
    "interest_expense",
    "ebit_after_interest",
    "ebit_after_tax",
    "ar",
    "inventory",
    "ap",
    "wc",
    "delta_wc",
    "delta_ar",
    "delta_inventory",
    "delta_ap",
    "fcf",
    "principal_payment",
    "fcf_after_debt",
    "debt_balance",
    "dscr",
    "cash_balance",
    "ccc",
    "gross_margin",
    "current_ratio",
    "quick_ratio",
    "days_cash_on_hand",
    "operating_margin",
];

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let run = commands::resolve_run(&args.business)?;

    let kinds = if args.scenarios.is_empty() {
        vec![
            ScenarioKind::Base,
            ScenarioKind::Conservative,
            ScenarioKind::Aggressive,
        ]
    } else {
        commands::parse_scenarios(&args.scenarios)?
    };

    let comparison =
        scenario::compare_scenarios(&run.inputs, run.num_months, run.debt.as_ref(), &kinds)?;

    let path = args.out.unwrap_or_else(|| {
        format!(
            "cash_flow_projections_{}.csv",
            Local::now().format("%Y%m%d_%H%M")
        )
    });

    let file =
        File::create(&path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    let mut wtr = csv::Writer::from_writer(file);

    let mut header: Vec<&str> = Vec::with_capacity(COLUMNS.len() + 1);
    header.push("scenario");
    header.extend(COLUMNS);
    wtr.write_record(&header)?;

    let mut rows = 0usize;
    for scenario_run in &comparison.result.runs {
        let months = serde_json::to_value(&scenario_run.projection.months)?;
        if let Value::Array(month_rows) = months {
            for month in &month_rows {
                let Some(fields) = month.as_object() else {
                    continue;
                };
                let mut record: Vec<String> = Vec::with_capacity(header.len());
                record.push(scenario_run.name.clone());
                for column in COLUMNS {
                    record.push(fields.get(column).map(csv_cell).unwrap_or_default());
                }
                wtr.write_record(&record)?;
                rows += 1;
            }
        }
    }
    wtr.flush()?;

    Ok(serde_json::json!({
        "file": path,
        "scenarios": comparison
            .result
            .runs
            .iter()
            .map(|r| r.name.clone())
            .collect::<Vec<_>>(),
        "rows": rows,
        "warnings": comparison.warnings,
    }))
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
