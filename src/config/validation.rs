// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation for pipeline configurations.
//!
//! Checks run in order and every problem is collected, so a single pass
//! reports everything wrong with a file:
//!
//! 1. **Options**: the high-water mark must allow at least one buffered chunk
//! 2. **Ids**: every unit needs a non-empty id
//! 3. **Uniqueness**: ids double as unit names in logs, so they must be unique
//!
//! Whether a `processor` name exists is checked later by the local unit
//! factory, which owns the list of implementations.

use crate::config::consts::MIN_HIGH_WATER_MARK;
use crate::config::PipelineConfig;
use crate::errors::ConfigError;
use std::collections::HashSet;

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.options.high_water_mark < MIN_HIGH_WATER_MARK {
        errors.push(ConfigError::InvalidHighWaterMark {
            value: config.options.high_water_mark,
            minimum: MIN_HIGH_WATER_MARK,
        });
    }

    let mut seen = HashSet::new();
    for (position, unit) in config.units.iter().enumerate() {
        if unit.id.trim().is_empty() {
            errors.push(ConfigError::EmptyUnitId { position });
            continue;
        }
        if !seen.insert(unit.id.as_str()) {
            errors.push(ConfigError::DuplicateUnitId {
                unit_id: unit.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
