// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::chunk_text;
use crate::errors::UnitError;
use crate::observability::messages::{unit::ChunkTransformed, StructuredLog};
use crate::traits::Transform;
use crate::units::Chunk;

/// Configuration for the Prefix/Suffix Adder transform
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrefixSuffixConfig {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Prefix/Suffix Adder transform - wraps each text chunk
pub struct PrefixSuffixAdderTransform {
    config: PrefixSuffixConfig,
}

impl PrefixSuffixAdderTransform {
    pub fn new(config: PrefixSuffixConfig) -> Self {
        Self { config }
    }

    pub fn with_prefix_and_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: Some(prefix.into()),
            suffix: Some(suffix.into()),
        })
    }
}

#[async_trait]
impl Transform for PrefixSuffixAdderTransform {
    async fn transform(&mut self, chunk: Chunk) -> Result<Option<Chunk>, UnitError> {
        let start_time = Instant::now();
        let input = chunk_text(self.name(), &chunk)?;

        let mut result = String::new();
        if let Some(prefix) = &self.config.prefix {
            result.push_str(prefix);
        }
        result.push_str(&input);
        if let Some(suffix) = &self.config.suffix {
            result.push_str(suffix);
        }

        ChunkTransformed {
            unit: self.name(),
            input_size: input.len(),
            output_size: result.len(),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(Some(chunk.with_text(result)))
    }

    fn name(&self) -> &'static str {
        "prefix_suffix_adder"
    }
}
