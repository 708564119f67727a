//! Profiler configuration (moonwatch.toml)
//!
//! # Example moonwatch.toml
//!
//! ```toml
//! # Namespace to instrument, as a path from the globals (empty = globals)
//! root = ["game"]
//!
//! # Tables never entered during discovery
//! denylist = [
//!     ["_G"],
//!     ["package", "loaded"],
//!     ["package", "searchers"],
//!     ["coroutine"],
//! ]
//! ```

use crate::denylist::Denylist;
use crate::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Settings for a [`crate::Profiler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Path from the globals to the namespace to instrument
    pub root: Vec<String>,

    /// Global paths that discovery refuses to enter
    ///
    /// Default: `_G`, `package.loaded` and `package.searchers`.
    pub denylist: Vec<Vec<String>>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            root: Vec::new(),
            denylist: Denylist::default()
                .paths()
                .iter()
                .map(|path| path.segments().to_vec())
                .collect(),
        }
    }
}

impl ProfilerConfig {
    /// Load configuration from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use moonwatch::config::ProfilerConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = ProfilerConfig::from_file("moonwatch.toml")?;
    /// println!("{} denylisted tables", config.denylist.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (i, entry) in self.denylist.iter().enumerate() {
            if entry.is_empty() {
                return Err(format!("denylist entry {} is an empty path", i));
            }
            if entry.iter().any(String::is_empty) {
                return Err(format!(
                    "denylist entry {} has an empty segment: {:?}",
                    i, entry
                ));
            }
        }

        if self.root.iter().any(String::is_empty) {
            return Err(format!("root has an empty segment: {:?}", self.root));
        }

        Ok(())
    }

    pub fn root_path(&self) -> Path {
        Path::from(self.root.clone())
    }

    pub fn build_denylist(&self) -> Denylist {
        Denylist::new(
            self.denylist
                .iter()
                .map(|segments| Path::from(segments.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProfilerConfig::default();
        assert!(config.root.is_empty());
        assert_eq!(config.denylist.len(), 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.build_denylist(), Denylist::default());
        assert!(config.root_path().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            root = ["game", "systems"]
            denylist = [["_G"], ["coroutine"]]
        "#;

        let config = ProfilerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.root_path(), Path::from(["game", "systems"]));
        assert_eq!(
            config.build_denylist().paths(),
            [Path::from(["_G"]), Path::from(["coroutine"])]
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ProfilerConfig::from_toml_str("root = [\"app\"]").unwrap();
        assert_eq!(config.denylist, ProfilerConfig::default().denylist);

        let empty = ProfilerConfig::from_toml_str("").unwrap();
        assert_eq!(empty, ProfilerConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ProfilerConfig::from_toml_str("root = 5").is_err());
        assert!(ProfilerConfig::from_toml_str("denylist = [").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let config = ProfilerConfig {
            denylist: vec![vec![]],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("empty path"));

        let config = ProfilerConfig {
            denylist: vec![vec!["package".to_string(), String::new()]],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProfilerConfig {
            root: vec![String::new()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = ProfilerConfig::from_file("/nonexistent/moonwatch.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
