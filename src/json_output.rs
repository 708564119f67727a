//! JSON output format for call-graph reports
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "format": "moonwatch-json-v1",
//!   "total_time": 1.2,
//!   "functions": [
//!     {
//!       "function": "foo",
//!       "num_calls": 1,
//!       "min_time": 0.6,
//!       "max_time": 0.6,
//!       "total_time": 0.6,
//!       "avg_time": 0.6,
//!       "calls": [{ "callee": "bar", "num_calls": 2, "total_time": 0.15 }]
//!     }
//!   ]
//! }
//! ```

use crate::report::Report;
use serde::{Deserialize, Serialize};

/// Edge from a function to one of its callees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCallee {
    pub callee: String,
    pub num_calls: u64,
    pub total_time: f64,
}

/// Statistics for one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFunction {
    /// Dotted path of the function
    pub function: String,
    pub num_calls: u64,
    /// `null` until a call completes
    pub min_time: Option<f64>,
    pub max_time: f64,
    pub total_time: f64,
    pub avg_time: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<JsonCallee>,
}

/// Root JSON output structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Seconds between install and uninstall
    pub total_time: f64,
    pub functions: Vec<JsonFunction>,
}

impl JsonReport {
    pub fn from_report(report: &Report) -> Self {
        let functions = report
            .function_info
            .iter()
            .map(|(path, info)| JsonFunction {
                function: path.to_string(),
                num_calls: info.num_calls,
                min_time: info.has_completed_call().then_some(info.min_time),
                max_time: info.max_time,
                total_time: info.total_time,
                avg_time: info.average_time(),
                calls: info
                    .calls
                    .iter()
                    .map(|(callee, edge)| JsonCallee {
                        callee: callee.to_string(),
                        num_calls: edge.num_calls,
                        total_time: edge.total_time,
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "moonwatch-json-v1".to_string(),
            total_time: report.total_time,
            functions,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&Report> for JsonReport {
    fn from(report: &Report) -> Self {
        Self::from_report(report)
    }
}
