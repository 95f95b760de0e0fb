//! Plugin configuration
//!
//! Settings are loaded from an optional YAML file, then overridden by the
//! command line and finally by the `parameter` string protoc forwards from
//! `--pydocstring_opt=key=value,...`.

use crate::{PluginError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root of the YAML configuration file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Host prefixed to root-relative links (e.g., "https://cloud.google.com")
    pub docs_host: String,
    /// Suffix replacing ".proto" in output file names (e.g., "_pb2.py")
    pub module_suffix: String,
    /// Markup the comments are written in
    pub source_format: String,
    /// Markup the docstrings are emitted in
    pub target_format: String,
    /// External converter process
    pub converter: ConverterConfig,
}

/// How to run the external markup converter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Executable name or path
    pub command: PathBuf,
    /// Extra arguments placed before the format flags
    pub args: Vec<String>,
    /// Seconds to wait before giving up on the converter
    pub timeout_secs: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            docs_host: "https://cloud.google.com".to_string(),
            module_suffix: "_pb2.py".to_string(),
            source_format: "commonmark".to_string(),
            target_format: "rst".to_string(),
            converter: ConverterConfig::default(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("pandoc"),
            args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

impl PluginConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PluginError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            PluginError::Config(format!(
                "Failed to parse config YAML from {:?}: {}",
                path, e
            ))
        })
    }

    /// Parse configuration from YAML text; missing keys take their defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply a protoc plugin parameter string
    ///
    /// The string is a comma separated list of `key=value` pairs. Recognised
    /// keys: `docs_host`, `module_suffix`, `source_format`, `target_format`
    /// and `pandoc`.
    pub fn apply_parameter(&mut self, parameter: &str) -> Result<()> {
        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PluginError::Config(format!("Expected key=value in parameter, got '{}'", pair))
            })?;
            let value = value.trim();

            match key.trim() {
                "docs_host" => self.docs_host = value.trim_end_matches('/').to_string(),
                "module_suffix" => self.module_suffix = value.to_string(),
                "source_format" => self.source_format = value.to_string(),
                "target_format" => self.target_format = value.to_string(),
                "pandoc" => self.converter.command = PathBuf::from(value),
                other => {
                    return Err(PluginError::Config(format!(
                        "Unknown plugin parameter '{}'",
                        other
                    )))
                }
            }
        }

        Ok(())
    }

    /// Output module name for a .proto file (e.g., "foo/bar.proto" -> "foo/bar_pb2.py")
    pub fn module_name(&self, proto_file: &str) -> String {
        let stem = proto_file.strip_suffix(".proto").unwrap_or(proto_file);
        format!("{}{}", stem, self.module_suffix)
    }
}
