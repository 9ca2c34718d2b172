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

/// Target case for `ChangeTextCaseTransform`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Upper,
    Lower,
    Proper,
    Title,
}

/// Change Text Case transform - converts each text chunk to a different case
pub struct ChangeTextCaseTransform {
    case_type: CaseType,
}

impl ChangeTextCaseTransform {
    pub fn new(case_type: CaseType) -> Self {
        Self { case_type }
    }

    pub fn upper() -> Self {
        Self::new(CaseType::Upper)
    }

    pub fn lower() -> Self {
        Self::new(CaseType::Lower)
    }

    pub fn proper() -> Self {
        Self::new(CaseType::Proper)
    }

    pub fn title() -> Self {
        Self::new(CaseType::Title)
    }

    fn convert(&self, input: &str) -> String {
        match self.case_type {
            CaseType::Upper => input.to_uppercase(),
            CaseType::Lower => input.to_lowercase(),
            CaseType::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseType::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower_word = word.to_lowercase();
                    // Small words stay lowercase unless they open the title
                    if i == 0 || !is_small_word(&lower_word) {
                        capitalize(word)
                    } else {
                        lower_word
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_small_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

#[async_trait]
impl Transform for ChangeTextCaseTransform {
    async fn transform(&mut self, chunk: Chunk) -> Result<Option<Chunk>, UnitError> {
        let start_time = Instant::now();
        let input = chunk_text(self.name(), &chunk)?;
        let output = self.convert(&input);

        ChunkTransformed {
            unit: self.name(),
            input_size: input.len(),
            output_size: output.len(),
            duration: start_time.elapsed(),
        }
        .log();

        Ok(Some(chunk.with_text(output)))
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}
