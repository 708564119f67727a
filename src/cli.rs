//! CLI argument parsing for moonwatch

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the call-graph report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "moonwatch")]
#[command(version)]
#[command(about = "Call-graph profiler for Lua scripts", long_about = None)]
pub struct Cli {
    /// Lua script to load
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Global function to call once the script has loaded
    #[arg(value_name = "FUNCTION")]
    pub function: String,

    /// Arguments passed to FUNCTION as strings
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Profiler configuration file (TOML)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dotted path of the namespace to instrument (default: globals)
    #[arg(long = "root", value_name = "PATH")]
    pub root: Option<String>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_script_and_function() {
        let cli = Cli::parse_from(["moonwatch", "game.lua", "main"]);
        assert_eq!(cli.script, PathBuf::from("game.lua"));
        assert_eq!(cli.function, "main");
        assert!(cli.args.is_empty());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.config.is_none());
        assert!(cli.root.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_trailing_args() {
        let cli = Cli::parse_from(["moonwatch", "game.lua", "main", "10", "-v", "fast"]);
        assert_eq!(cli.args, ["10", "-v", "fast"]);
    }

    #[test]
    fn test_cli_format_flag() {
        let cli = Cli::parse_from(["moonwatch", "--format", "json", "game.lua", "main"]);
        assert_eq!(cli.format, OutputFormat::Json);
        let cli = Cli::parse_from(["moonwatch", "--format", "csv", "game.lua", "main"]);
        assert_eq!(cli.format, OutputFormat::Csv);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = Cli::try_parse_from(["moonwatch", "--format", "xml", "game.lua", "main"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_config_root_and_debug() {
        let cli = Cli::parse_from([
            "moonwatch",
            "--config",
            "moonwatch.toml",
            "--root",
            "game.systems",
            "--debug",
            "game.lua",
            "main",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("moonwatch.toml")));
        assert_eq!(cli.root.as_deref(), Some("game.systems"));
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_requires_function() {
        assert!(Cli::try_parse_from(["moonwatch", "game.lua"]).is_err());
    }
}
