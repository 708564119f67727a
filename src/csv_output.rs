//! CSV output format for call-graph reports
//!
//! One row per function with an empty `callee` column, followed by one row
//! per outgoing edge. Edge rows leave the min/max/avg columns empty.

use crate::report::Report;

const HEADER: &str = "function,callee,calls,min_time,max_time,total_time,avg_time";

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render `report` as CSV, header included
pub fn format_report(report: &Report) -> String {
    let mut output = String::new();
    output.push_str(HEADER);
    output.push('\n');

    for (path, info) in &report.function_info {
        let function = escape_field(&path.to_string());
        let min_time = if info.has_completed_call() {
            format!("{:.9}", info.min_time)
        } else {
            String::new()
        };
        let fields = [
            function.clone(),
            String::new(),
            info.num_calls.to_string(),
            min_time,
            format!("{:.9}", info.max_time),
            format!("{:.9}", info.total_time),
            format!("{:.9}", info.average_time()),
        ];
        output.push_str(&fields.join(","));
        output.push('\n');

        for (callee, edge) in &info.calls {
            let fields = [
                function.clone(),
                escape_field(&callee.to_string()),
                edge.num_calls.to_string(),
                String::new(),
                String::new(),
                format!("{:.9}", edge.total_time),
                String::new(),
            ];
            output.push_str(&fields.join(","));
            output.push('\n');
        }
    }

    output
}
