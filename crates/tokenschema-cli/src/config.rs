//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables
//! - Command-line arguments
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::cli::ValidateArgs;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokenschema_core::{PropertyNameComparison, ValidatorSettings};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validator behavior
    pub validation: ValidationConfig,

    /// Logging settings
    pub logging: LoggingSection,
}

/// Validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// How `properties`, `required` and `dependencies` compare names
    pub property_names: PropertyNameComparison,

    /// Limit for a single pattern match, in milliseconds
    pub regex_timeout_ms: Option<u64>,

    /// Check the `format` keyword
    pub validate_formats: bool,
}

/// Logging settings from the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            property_names: PropertyNameComparison::Ordinal,
            regex_timeout_ms: None,
            validate_formats: true,
        }
    }
}

impl ValidationConfig {
    /// Apply command-line flags over file and environment values
    pub fn apply_args(&mut self, args: &ValidateArgs) {
        if args.ignore_case {
            self.property_names = PropertyNameComparison::IgnoreCase;
        }
        if let Some(timeout) = args.regex_timeout_ms {
            self.regex_timeout_ms = Some(timeout);
        }
        if args.no_format {
            self.validate_formats = false;
        }
    }

    /// Validator settings without a schema
    pub fn to_settings(&self) -> ValidatorSettings {
        let mut settings = ValidatorSettings::new()
            .with_property_name_comparison(self.property_names)
            .with_format_validation(self.validate_formats);
        if let Some(timeout) = self.regex_timeout_ms {
            settings = settings.with_regex_timeout(Duration::from_millis(timeout));
        }
        settings
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable configuration");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.merge_with_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TOKENSCHEMA_*` overrides read through `lookup`
    pub fn merge_with_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TOKENSCHEMA_IGNORE_CASE") {
            if parse_flag("TOKENSCHEMA_IGNORE_CASE", &value)? {
                self.validation.property_names = PropertyNameComparison::IgnoreCase;
            }
        }
        if let Some(value) = lookup("TOKENSCHEMA_REGEX_TIMEOUT_MS") {
            let timeout = value.parse::<u64>().map_err(|_| {
                Error::config(format!(
                    "TOKENSCHEMA_REGEX_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    value
                ))
            })?;
            self.validation.regex_timeout_ms = Some(timeout);
        }
        if let Some(value) = lookup("TOKENSCHEMA_VALIDATE_FORMATS") {
            self.validation.validate_formats = parse_flag("TOKENSCHEMA_VALIDATE_FORMATS", &value)?;
        }
        Ok(())
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".tokenschema.yaml"),
            PathBuf::from(".tokenschema.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join("tokenschema");
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".tokenschema.yaml"));
            paths.push(home_dir.join(".tokenschema.json"));
        }

        paths
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}
