// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating pipeline configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML pipeline config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML pipeline config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format for '{path}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat { path: PathBuf },

    /// A unit entry has an empty id
    #[error("unit at position {position} has an empty id")]
    EmptyUnitId { position: usize },

    #[error("duplicate unit id: '{unit_id}'")]
    DuplicateUnitId { unit_id: String },

    #[error("high_water_mark must be at least {minimum}, got {value}")]
    InvalidHighWaterMark { value: usize, minimum: usize },

    #[error("unknown local unit implementation '{processor}' for unit '{unit_id}'")]
    UnknownProcessor { unit_id: String, processor: String },

    #[error("invalid options for unit '{unit_id}': {reason}")]
    InvalidUnitOptions { unit_id: String, reason: String },

    /// Every problem found by `validate_pipeline_config`
    #[error("configuration validation failed:\n{}", join_errors(.0))]
    Validation(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
