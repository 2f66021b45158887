use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: a projection run answers with its final cash balance, a
/// scenario comparison with the base run's, the growth sweep with its
/// sustainable-growth ceiling, an export with the file it wrote. Fall back
/// to the first field of the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        // A full projection carries the headline number in its summary
        if let Some(final_cash) = map.get("summary").and_then(|s| s.get("final_cash_balance")) {
            return format_minimal(final_cash);
        }

        // A comparison leads with the base row, which is always first
        if let Some(base_cash) = map
            .get("comparison")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("final_cash_balance"))
        {
            return format_minimal(base_cash);
        }

        // Priority list of key output fields (skip null values)
        let priority_keys = [
            "max_sustainable_growth",
            "final_cash_balance",
            "cumulative_fcf",
            "file",
        ];
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    // Not an object, just print directly
    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
