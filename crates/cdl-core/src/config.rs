//! Conversion settings loaded from YAML.
//!
//! ```rust
//! use cdl_core::Config;
//!
//! let config = Config::from_yaml_str("strict_errors: true\ndest_format: cdl\n").unwrap();
//! assert!(config.strict_errors);
//! assert_eq!(config.dest_format.as_deref(), Some("cdl"));
//! assert!(config.scan_directories);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CdlError, CdlResult, ValuePolicy};

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fail on out-of-domain values instead of clamping them.
    pub strict_errors: bool,
    /// Output format used when none is given on the command line.
    pub dest_format: Option<String>,
    /// Allow media references to list directories for sequence detection.
    pub scan_directories: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict_errors: false,
            dest_format: None,
            scan_directories: true,
        }
    }
}

impl Config {
    /// Loads a config file.
    pub fn load(path: impl AsRef<Path>) -> CdlResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CdlError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses a config from YAML. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> CdlResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serializes the config to YAML.
    pub fn to_yaml_string(&self) -> CdlResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Policy implied by `strict_errors`.
    pub fn policy(&self) -> ValuePolicy {
        ValuePolicy::from_strict(self.strict_errors)
    }
}
