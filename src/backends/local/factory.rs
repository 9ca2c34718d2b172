// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;

use super::processors::*;
use crate::config::{ComposeOptions, UnitConfig};
use crate::errors::ConfigError;
use crate::units::{Unit, UnitSettings};

/// Factory for creating local (in-process) units from configuration
pub struct LocalUnitFactory;

impl LocalUnitFactory {
    /// Create a unit from configuration.
    ///
    /// The `processor` field selects the implementation:
    /// - "change_text_case_upper" / "_lower" / "_proper" / "_title" -> ChangeTextCaseTransform
    /// - "change_text_case" -> ChangeTextCaseTransform, `case_type` option required
    /// - "reverse_text" -> ReverseTextTransform
    /// - "prefix_suffix_adder" -> PrefixSuffixAdderTransform, `prefix`/`suffix` options
    /// - "passthrough" -> neutral unit
    ///
    /// The unit is named after the config `id`; buffer size and mode come from
    /// the pipeline options.
    pub fn create_unit(config: &UnitConfig, options: &ComposeOptions) -> Result<Unit, ConfigError> {
        let settings = UnitSettings {
            name: Some(config.id.clone()),
            ..UnitSettings::from(options)
        };

        let unit = match config.processor.as_str() {
            "change_text_case_upper" => Unit::transform_with(ChangeTextCaseTransform::upper(), settings),
            "change_text_case_lower" => Unit::transform_with(ChangeTextCaseTransform::lower(), settings),
            "change_text_case_proper" => Unit::transform_with(ChangeTextCaseTransform::proper(), settings),
            "change_text_case_title" => Unit::transform_with(ChangeTextCaseTransform::title(), settings),
            "change_text_case" => {
                let case: CaseOptions = parse_options(config)?;
                Unit::transform_with(ChangeTextCaseTransform::new(case.case_type), settings)
            }
            "reverse_text" => Unit::transform_with(ReverseTextTransform::new(), settings),
            "prefix_suffix_adder" => {
                let adder: PrefixSuffixConfig = parse_options(config)?;
                Unit::transform_with(PrefixSuffixAdderTransform::new(adder), settings)
            }
            "passthrough" => Unit::passthrough_with(settings),
            other => {
                return Err(ConfigError::UnknownProcessor {
                    unit_id: config.id.clone(),
                    processor: other.to_string(),
                })
            }
        };
        Ok(unit)
    }

    /// List all available local unit implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "change_text_case_upper",
            "change_text_case_lower",
            "change_text_case_proper",
            "change_text_case_title",
            "change_text_case",
            "reverse_text",
            "prefix_suffix_adder",
            "passthrough",
        ]
    }

    pub fn is_implementation_available(processor: &str) -> bool {
        Self::list_available_implementations().contains(&processor)
    }
}

#[derive(serde::Deserialize)]
struct CaseOptions {
    case_type: CaseType,
}

fn parse_options<T: DeserializeOwned>(config: &UnitConfig) -> Result<T, ConfigError> {
    let mapping = config
        .options
        .iter()
        .map(|(key, value)| (serde_yaml::Value::String(key.clone()), value.clone()))
        .collect::<serde_yaml::Mapping>();

    serde_yaml::from_value(serde_yaml::Value::Mapping(mapping)).map_err(|e| {
        ConfigError::InvalidUnitOptions {
            unit_id: config.id.clone(),
            reason: e.to_string(),
        }
    })
}
