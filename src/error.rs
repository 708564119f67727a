//! Error type for the instrumentation engine

use thiserror::Error;

/// Errors returned by discovery and installation
#[derive(Error, Debug)]
pub enum Error {
    /// The default instruments need a clock and none was configured
    #[error("no clock set: call set_clock before installing the default instruments")]
    ClockNotSet,

    /// Discovery was asked to search something that is not a composite
    #[error("cannot search a {kind} value for functions (expected a table or protocol composite)")]
    InvalidRoot { kind: String },

    /// The configured root namespace does not resolve from the globals
    #[error("root namespace not found: {path}")]
    UnknownRoot { path: String },

    /// Rejected profiler configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
