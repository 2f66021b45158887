use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Projection envelopes nest whole month series and per-scenario runs inside
/// the result, so the scalar fields go into one Field/Value table and each
/// nested series gets its own named table below it.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_sections(result, map);
            } else {
                print_record(value);
            }
        }
        Value::Array(arr) => {
            print_rows(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_sections(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut scalar_count = 0;
        for (key, val) in res_map {
            if !matches!(val, Value::Object(_) | Value::Array(_)) {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalar_count += 1;
            }
        }
        if scalar_count > 0 {
            let table = Table::from(builder);
            println!("{}", table);
        }

        for (key, val) in res_map {
            match val {
                Value::Array(rows) => {
                    println!("\n{}:", key);
                    print_rows(rows);
                }
                Value::Object(_) => {
                    println!("\n{}:", key);
                    print_record(val);
                }
                _ => {}
            }
        }
    } else {
        print_record(&Value::Object(envelope.clone()));
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_record(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Column per scalar key of the first row; nested values such as the
    // full inputs echoed inside a scenario run would swamp the grid
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Object(_) | Value::Array(_)))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(format_value)
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
