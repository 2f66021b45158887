use clap::Args;
use serde_json::{json, Value};

use crate::templates;

/// Arguments for the template catalog
#[derive(Args)]
pub struct TemplatesArgs {
    /// Show one template as a ready-to-use input record
    #[arg(long)]
    pub show: Option<String>,
}

pub fn run_templates(args: TemplatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref name) = args.show {
        let template = templates::by_key(name).ok_or_else(|| {
            format!(
                "Unknown template '{}'. Available templates: {}",
                name,
                templates::KEYS.join(", ")
            )
        })?;

        // The record deserializes straight back into a run request, so it
        // can be saved and fed to `--input` as-is
        let mut record = serde_json::to_value(&template.request)?;
        if let Some(fields) = record.as_object_mut() {
            fields.insert("key".into(), json!(template.key));
            fields.insert("label".into(), json!(template.label));
        }
        return Ok(record);
    }

    let rows: Vec<Value> = templates::catalog()
        .iter()
        .map(|template| {
            let inputs = &template.request.inputs;
            json!({
                "key": template.key,
                "label": template.label,
                "revenue": inputs.revenue,
                "cogs_pct": inputs.cogs_pct,
                "monthly_growth": inputs.price_increase,
                "opening_cash": inputs.opening_cash,
                "loan_amount": template.request.debt.as_ref().map(|d| d.loan_amount),
            })
        })
        .collect();

    Ok(Value::Array(rows))
}
