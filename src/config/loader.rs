// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_HIGH_WATER_MARK;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Options recognized when composing a pipeline.
///
/// `object_mode` and `high_water_mark` are forwarded into every unit the
/// composer synthesizes (neutral passthrough, duplex facade, standardized
/// reader). `bubble_errors` is carried into those wrappers as well but has no
/// behavior of its own: member errors are always relayed by the composer.
///
/// # Example
/// ```yaml
/// object_mode: true
/// bubble_errors: false
/// high_water_mark: 16
/// close_policy: settle_success
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComposeOptions {
    pub object_mode: bool,
    pub bubble_errors: bool,
    pub high_water_mark: usize,
    pub close_policy: ClosePolicy,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            object_mode: true,
            bubble_errors: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            close_policy: ClosePolicy::default(),
        }
    }
}

impl ComposeOptions {
    /// Byte-oriented options with every other field at its default
    pub fn bytes() -> Self {
        Self {
            object_mode: false,
            ..Self::default()
        }
    }
}

/// How a Close notification from the tail settles the pipeline when no error
/// was observed first.
///
/// # Variants
/// * `SettleSuccess` - any close counts as success
/// * `RequireFinish` - a close from a tail that never finished its work settles
///   as a `PrematureClose` failure
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClosePolicy {
    #[default]
    SettleSuccess,
    RequireFinish,
}

/// A pipeline definition loaded from disk: options plus the ordered units.
///
/// # Example
/// ```yaml
/// options:
///   object_mode: true
/// units:
///   - id: shout
///     processor: change_text_case_upper
///   - id: brackets
///     processor: prefix_suffix_adder
///     options:
///       prefix: "["
///       suffix: "]"
/// ```
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub options: ComposeOptions,
    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

/// Configuration for a single unit in the pipeline.
///
/// # Fields
/// * `id` - Unique identifier, used as the unit's name in logs
/// * `processor` - Local implementation name (see `LocalUnitFactory`)
/// * `options` - Implementation-specific options
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    pub id: String,
    pub processor: String,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

/// Load a pipeline config, picking YAML or TOML from the file extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load a pipeline config and reject it if validation finds any problem
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_pipeline_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
options:
  object_mode: false
units:
  - id: shout
    processor: change_text_case_upper
  - id: flip
    processor: reverse_text
"#;

        let cfg: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!cfg.options.object_mode);
        assert_eq!(cfg.options.high_water_mark, DEFAULT_HIGH_WATER_MARK);
        assert_eq!(cfg.units.len(), 2);
        assert_eq!(cfg.units[1].processor, "reverse_text");
    }

    #[test]
    fn test_options_defaults() {
        let options = ComposeOptions::default();
        assert!(options.object_mode);
        assert!(!options.bubble_errors);
        assert_eq!(options.close_policy, ClosePolicy::SettleSuccess);
        assert!(!ComposeOptions::bytes().object_mode);
    }

    #[test]
    fn test_parse_close_policy() {
        let yaml = "close_policy: require_finish\nhigh_water_mark: 2\n";
        let options: ComposeOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.close_policy, ClosePolicy::RequireFinish);
        assert_eq!(options.high_water_mark, 2);
        assert!(options.object_mode);
    }

    #[test]
    fn test_parse_unit_with_options() {
        let yaml = r#"
units:
  - id: brackets
    processor: prefix_suffix_adder
    options:
      prefix: "<"
      suffix: ">"
"#;

        let cfg: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        let unit = &cfg.units[0];
        assert_eq!(unit.options.len(), 2);
        assert!(unit.options.contains_key("prefix"));
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_temp(
            ".yaml",
            "units:\n  - id: a\n    processor: reverse_text\n",
        );
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.units[0].id, "a");
    }

    #[test]
    fn test_load_toml_file() {
        let toml = r#"
[options]
object_mode = false
high_water_mark = 4

[[units]]
id = "shout"
processor = "change_text_case_upper"
"#;
        let file = write_temp(".toml", toml);
        let cfg = load_config(file.path()).unwrap();
        assert!(!cfg.options.object_mode);
        assert_eq!(cfg.options.high_water_mark, 4);
        assert_eq!(cfg.units[0].processor, "change_text_case_upper");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let file = write_temp(".json", "{}");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_and_validate_duplicate_ids() {
        let yaml = r#"
units:
  - id: a
    processor: reverse_text
  - id: a
    processor: reverse_text
"#;
        let file = write_temp(".yml", yaml);
        let error = load_and_validate_config(file.path()).unwrap_err();
        assert!(error.to_string().contains("duplicate unit id: 'a'"));
    }
}
