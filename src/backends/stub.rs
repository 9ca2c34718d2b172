// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::UnitError;
use crate::traits::{Sink, Source, Transform};
use crate::units::Chunk;

/// A transform that fails on the first chunk it sees
pub struct FailingTransform {
    message: String,
}

impl FailingTransform {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Transform for FailingTransform {
    async fn transform(&mut self, _chunk: Chunk) -> Result<Option<Chunk>, UnitError> {
        Err(UnitError::new(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Shared counter readable from the test body
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A source yielding the integers `0..limit` as item chunks
pub struct CountingSource {
    next: usize,
    limit: usize,
    produced: Counter,
}

impl CountingSource {
    pub fn new(limit: usize) -> (Self, Counter) {
        let produced = Counter::default();
        (
            Self {
                next: 0,
                limit,
                produced: produced.clone(),
            },
            produced,
        )
    }
}

#[async_trait]
impl Source for CountingSource {
    async fn produce(&mut self) -> Option<Result<Chunk, UnitError>> {
        if self.next == self.limit {
            return None;
        }
        let chunk = Chunk::from(serde_json::json!(self.next));
        self.next += 1;
        self.produced.bump();
        Some(Ok(chunk))
    }

    fn name(&self) -> &'static str {
        "counting_source"
    }
}

/// A sink that fails on any chunk other than the expected text, counting matches
pub struct ExpectingSink {
    expected: String,
    received: Counter,
}

impl ExpectingSink {
    pub fn new(expected: impl Into<String>) -> (Self, Counter) {
        let received = Counter::default();
        (
            Self {
                expected: expected.into(),
                received: received.clone(),
            },
            received,
        )
    }
}

#[async_trait]
impl Sink for ExpectingSink {
    async fn consume(&mut self, chunk: Chunk) -> Result<(), UnitError> {
        if chunk.as_text() != Some(self.expected.as_str()) {
            return Err(UnitError::new(format!(
                "expected {:?}, received {:?}",
                self.expected, chunk
            )));
        }
        self.received.bump();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "expecting_sink"
    }
}

/// A sink that waits a scheduling turn per chunk, so upstream outruns it
pub struct SlowSink {
    received: Counter,
}

impl SlowSink {
    pub fn new() -> (Self, Counter) {
        let received = Counter::default();
        (
            Self {
                received: received.clone(),
            },
            received,
        )
    }
}

#[async_trait]
impl Sink for SlowSink {
    async fn consume(&mut self, _chunk: Chunk) -> Result<(), UnitError> {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        self.received.bump();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slow_sink"
    }
}
