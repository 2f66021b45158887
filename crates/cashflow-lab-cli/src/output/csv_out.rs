use serde_json::Value;
use std::io;

/// Result fields that hold the month-by-month or per-scenario series. The
/// first one present becomes the CSV body.
const SERIES_KEYS: [&str; 3] = ["months", "comparison", "runways"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            if let Some(rows) = find_series(result) {
                write_rows(&mut wtr, rows);
            } else if let Value::Object(fields) = result {
                // Two-column CSV: field, value
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in fields {
                    if !matches!(val, Value::Object(_) | Value::Array(_)) {
                        let _ = wtr.write_record([key.as_str(), &cell(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => {
            write_rows(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&cell(value)]);
        }
    }

    let _ = wtr.flush();
}

fn find_series(result: &Value) -> Option<&Vec<Value>> {
    for key in &SERIES_KEYS {
        if let Some(Value::Array(rows)) = result.get(*key) {
            return Some(rows);
        }
    }
    None
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Headers from the scalar fields of the first row
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Object(_) | Value::Array(_)))
            .map(|(k, _)| k.as_str())
            .collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(cell).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&cell(item)]);
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
