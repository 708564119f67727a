//! Call-graph performance report
//!
//! A [`Report`] maps each instrumented [`Path`] that was called to its node
//! statistics, and each node to the edges it called out to. Reports are plain
//! values: [`crate::Profiler::generate_report`] hands out copies.

use crate::path::Path;
use std::collections::BTreeMap;

/// Time a specific caller spent inside a specific callee
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CallsInformation {
    /// Number of times the caller called the callee
    pub num_calls: u64,
    /// Total seconds elapsed in those calls
    pub total_time: f64,
}

/// Statistics for one function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInformation {
    pub num_calls: u64,
    /// Shortest completed call in seconds, `+inf` until a call completes
    pub min_time: f64,
    pub max_time: f64,
    pub total_time: f64,
    /// Functions called from this one
    pub calls: BTreeMap<Path, CallsInformation>,
}

impl Default for FunctionInformation {
    fn default() -> Self {
        Self {
            num_calls: 0,
            min_time: f64::INFINITY,
            max_time: 0.0,
            total_time: 0.0,
            calls: BTreeMap::new(),
        }
    }
}

impl FunctionInformation {
    /// Fold one completed call into min/max/total
    pub fn record_elapsed(&mut self, elapsed: f64) {
        self.min_time = self.min_time.min(elapsed);
        self.max_time = self.max_time.max(elapsed);
        self.total_time += elapsed;
    }

    /// Mean seconds per call (0 when never called)
    pub fn average_time(&self) -> f64 {
        if self.num_calls == 0 {
            0.0
        } else {
            self.total_time / self.num_calls as f64
        }
    }

    /// Whether at least one call has returned
    pub fn has_completed_call(&self) -> bool {
        self.min_time.is_finite()
    }
}

/// Snapshot of everything the default instruments collected
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub function_info: BTreeMap<Path, FunctionInformation>,
    /// Seconds covered by the statistics window (install to uninstall)
    pub total_time: f64,
}

impl Report {
    pub fn get(&self, path: &Path) -> Option<&FunctionInformation> {
        self.function_info.get(path)
    }

    pub fn len(&self) -> usize {
        self.function_info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.function_info.is_empty()
    }

    /// Total number of instrumented calls across all functions
    pub fn total_calls(&self) -> u64 {
        self.function_info.values().map(|info| info.num_calls).sum()
    }

    /// Check the structural invariants of a report taken with no call in flight
    ///
    /// - calls into a function along edges never exceed its call count
    /// - edges only point at functions that have a node entry
    /// - `min <= average <= max` for every called function
    pub fn check_invariants(&self) -> Result<(), String> {
        const TOLERANCE: f64 = 1e-9;

        let mut incoming: BTreeMap<&Path, u64> = BTreeMap::new();
        for (caller, info) in &self.function_info {
            for (callee, edge) in &info.calls {
                if !self.function_info.contains_key(callee) {
                    return Err(format!("edge {} -> {} has no callee entry", caller, callee));
                }
                *incoming.entry(callee).or_default() += edge.num_calls;
            }
        }

        for (path, info) in &self.function_info {
            let into = incoming.get(path).copied().unwrap_or(0);
            if into > info.num_calls {
                return Err(format!(
                    "{} is called {} times along edges but only {} times in total",
                    path, into, info.num_calls
                ));
            }
            if info.num_calls > 0 && info.has_completed_call() {
                let average = info.average_time();
                if info.min_time > average + TOLERANCE || average > info.max_time + TOLERANCE {
                    return Err(format!(
                        "{}: expected min {} <= average {} <= max {}",
                        path, info.min_time, average, info.max_time
                    ));
                }
            }
        }
        Ok(())
    }
}
