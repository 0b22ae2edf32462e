use serde_json::Value;

/// Print just the headline number of the output.
///
/// Looks for well-known KPI fields in order of priority, in the result
/// object and then in a nested `summary`, before falling back to the first
/// field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "expected_total_net_income",
        "delta_expected_total_net_income",
        "total_net_income",
    ];

    let scopes = [Some(result_obj), result_obj.get("summary"), result_obj.get("result")];
    for map in scopes.iter().flatten().filter_map(|v| v.as_object()) {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
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
