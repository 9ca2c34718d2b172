// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::errors::UnitError;
use crate::traits::Source;
use crate::units::Chunk;

/// Source yielding a fixed list of chunks, then ending
pub struct IterSource {
    chunks: VecDeque<Chunk>,
}

impl IterSource {
    pub fn new(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|text| Chunk::text(text)))
    }
}

#[async_trait]
impl Source for IterSource {
    async fn produce(&mut self) -> Option<Result<Chunk, UnitError>> {
        self.chunks.pop_front().map(Ok)
    }

    fn name(&self) -> &'static str {
        "iter_source"
    }
}
