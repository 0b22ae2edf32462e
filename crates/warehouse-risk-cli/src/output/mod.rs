pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Rows worth tabulating inside a result: the path table of a run or the
/// monthly snapshots of a trace.
pub(crate) fn result_rows(result: &Value) -> Option<&[Value]> {
    result
        .pointer("/table/paths")
        .or_else(|| result.get("months"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}
