use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::type_map::DEFAULT_STRING_MAX_LENGTH;

/// Configuration for the Django app generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output directory, also the source of the app name
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// `max_length` of the `CharField` generated for `string` fields
    #[serde(default = "default_string_max_length")]
    pub string_max_length: u32,

    /// Directory of `<template name>.jinja` files replacing built-in templates
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Whether to log fields that reference types missing from the schema
    #[serde(default = "default_true")]
    pub warn_dangling_references: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: default_output_dir(),
            string_max_length: default_string_max_length(),
            template_dir: None,
            warn_dangling_references: default_true(),
        }
    }
}

// Default helper functions
fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "generated_app".to_string()
}

fn default_string_max_length() -> u32 {
    DEFAULT_STRING_MAX_LENGTH
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the output directory
    pub fn output_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}
