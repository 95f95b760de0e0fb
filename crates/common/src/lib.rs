//! Common types and utilities for protoc-docs
//!
//! This crate contains the documented-structure model, its registry, the
//! plugin configuration and the error type shared by the parser, generator
//! and CLI components.

mod config;
mod structure;

pub use config::{ConverterConfig, PluginConfig};
pub use structure::{DocumentedStructure, StructureHandle, StructureRegistry};

use thiserror::Error;

/// Errors that can occur while producing documentation
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
