// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::UnitError;
use crate::traits::Sink;
use crate::units::Chunk;

/// Shared view of everything a `CollectorSink` has received
#[derive(Clone, Default)]
pub struct Collected {
    chunks: Arc<Mutex<Vec<Chunk>>>,
}

impl Collected {
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Received chunks decoded as text; non-text chunks are skipped
    pub fn texts(&self) -> Vec<String> {
        self.chunks().iter().filter_map(Chunk::to_text).collect()
    }

    pub fn len(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, chunk: Chunk) {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk);
    }
}

/// Sink that keeps every chunk it is given
pub struct CollectorSink {
    collected: Collected,
}

impl CollectorSink {
    pub fn new() -> (Self, Collected) {
        let collected = Collected::default();
        (
            Self {
                collected: collected.clone(),
            },
            collected,
        )
    }
}

#[async_trait]
impl Sink for CollectorSink {
    async fn consume(&mut self, chunk: Chunk) -> Result<(), UnitError> {
        self.collected.push(chunk);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
