// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Instant;

use super::chunk_text;
use crate::errors::UnitError;
use crate::observability::messages::{unit::ChunkTransformed, StructuredLog};
use crate::traits::Transform;
use crate::units::Chunk;

/// Reverse Text transform - reverses each text chunk
#[derive(Default)]
pub struct ReverseTextTransform;

impl ReverseTextTransform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transform for ReverseTextTransform {
    async fn transform(&mut self, chunk: Chunk) -> Result<Option<Chunk>, UnitError> {
        let start_time = Instant::now();
        let input = chunk_text(self.name(), &chunk)?;
        let reversed: String = input.chars().rev().collect();

        ChunkTransformed {
            unit: self.name(),
            input_size: input.len(),
            output_size: reversed.len(),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(Some(chunk.with_text(reversed)))
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}
