//! moonwatch - call-graph profiler for embedded Lua
//!
//! This library walks a Lua namespace, swaps every reachable function for an
//! instrumented wrapper and collects per-function and per-edge timing
//! statistics until the wrappers are removed again.

pub mod aggregator;
pub mod cli;
pub mod clock;
pub mod composite;
pub mod config;
pub mod csv_output;
pub mod denylist;
pub mod error;
pub mod installer;
pub mod instrument;
pub mod json_output;
pub mod path;
pub mod profiler;
pub mod report;
pub mod script;
pub mod text_output;
pub mod walker;

pub use aggregator::TimingAggregator;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use denylist::Denylist;
pub use error::{Error, Result};
pub use instrument::{HookPair, Instruments};
pub use path::Path;
pub use profiler::Profiler;
pub use report::{CallsInformation, FunctionInformation, Report};
pub use walker::{discover, discover_with, DiscoveredFunction};
