use serde_json::Value;
use tabled::{builder::Builder, Table};

use crate::output::SCHEDULE_KEYS;

/// Format output as tables: scalar result fields first, then the summary,
/// then any schedule as month-rows.
pub fn print_table(value: &Value) {
    match value.as_object() {
        Some(map) if map.contains_key("result") => print_envelope(map),
        _ => print_flat_object(value),
    }
}

fn print_envelope(envelope: &serde_json::Map<String, Value>) {
    let result = match envelope.get("result") {
        Some(r) => r,
        None => return,
    };

    if let Value::Object(fields) = result {
        // Scalar result fields.
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut has_scalars = false;
        for (key, val) in fields {
            if !matches!(val, Value::Array(_) | Value::Object(_)) {
                builder.push_record([key.as_str(), &format_value(val)]);
                has_scalars = true;
            }
        }
        if has_scalars {
            println!("{}", Table::from(builder));
        }

        // Nested summary block.
        if let Some(Value::Object(summary)) = fields.get("summary") {
            let mut builder = Builder::default();
            builder.push_record(["Summary", "Value"]);
            for (key, val) in summary {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));
        }

        // Month-row schedules.
        for key in SCHEDULE_KEYS {
            if let Some(Value::Array(rows)) = fields.get(key) {
                if !rows.is_empty() {
                    println!("\n{}:", key);
                    print_schedule_rows(rows);
                }
            }
        }
    } else {
        print_flat_object(result);
    }

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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_schedule_rows(rows: &[Value]) {
    let headers: Vec<String> = match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => {
            for row in rows {
                println!("{}", format_value(row));
            }
            return;
        }
    };

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
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
