use serde_json::Value;

/// Print just the headline number from the output.
///
/// Projections lead with their savings figures; a plan output falls back to
/// the summary's first monthly payment, then to the first scalar field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "total_savings",
        "interest_saved",
        "months_saved",
        "new_monthly_payment",
        "monthly_savings",
        "worth_it",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some(Value::Object(summary)) = map.get("summary") {
            if let Some(val) = summary.get("first_monthly_payment") {
                println!("{}", format_minimal(val));
                return;
            }
        }

        if let Some((key, val)) = map
            .iter()
            .find(|(_, v)| !matches!(v, Value::Array(_) | Value::Object(_)))
        {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
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
