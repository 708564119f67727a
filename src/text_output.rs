//! Plain-text call-graph table
//!
//! One row per function, sorted by path, followed by an indented row for each
//! function it called:
//!
//! ```text
//! FUNC                       #             MIN            MAX          TOTAL            AVG
//! foo                        1     0.600000000    0.600000000    0.600000000    0.600000000
//!   bar                      2                                   0.150000000
//! ```

use crate::report::{FunctionInformation, Report};

const RULE_WIDTH: usize = 89;

/// Render `report` as a text table
pub fn format_report(report: &Report) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Report: {:.9}s profiled\n", report.total_time));
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "{:<20} {:>7}  {:>14} {:>14} {:>14} {:>14}\n",
        "FUNC", "#", "MIN", "MAX", "TOTAL", "AVG"
    ));

    for (path, info) in &report.function_info {
        out.push_str(&format!(
            "{:<20} {:>7}  {:>14} {:>14.9} {:>14.9} {:>14.9}\n",
            path.to_string(),
            info.num_calls,
            min_column(info),
            info.max_time,
            info.total_time,
            info.average_time()
        ));
        for (callee, edge) in &info.calls {
            out.push_str(&format!(
                "  {:<18} {:>7}  {:>14} {:>14} {:>14.9} {:>14}\n",
                callee.to_string(),
                edge.num_calls,
                "",
                "",
                edge.total_time,
                ""
            ));
        }
    }

    out.push_str(&format!("{}\n", rule));
    out
}

// A function that never returned has no minimum
fn min_column(info: &FunctionInformation) -> String {
    if info.has_completed_call() {
        format!("{:.9}", info.min_time)
    } else {
        "-".to_string()
    }
}
