// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for unit lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Unit failure, finish, end and destruction
//! * Chunks rejected by a unit's stream mode
//! * Transform timings
//! * Event listeners falling behind

use crate::errors::UnitError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A unit failed and is about to close.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_conduit::errors::UnitError;
/// use the_conduit::observability::messages::unit::UnitFailed;
///
/// let error = UnitError::new("disk full");
/// let msg = UnitFailed {
///     unit: "writer",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct UnitFailed<'a> {
    pub unit: &'a str,
    pub error: &'a UnitError,
}

impl Display for UnitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit '{}' failed: {}", self.unit, self.error)
    }
}

impl StructuredLog for UnitFailed<'_> {
    fn log(&self) {
        tracing::error!(unit = self.unit, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unit_failed",
            span_name = name,
            unit = self.unit,
            error = %self.error,
        )
    }
}

/// A writable unit processed everything written to it.
pub struct UnitFinished<'a> {
    pub unit: &'a str,
}

impl Display for UnitFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit '{}' finished", self.unit)
    }
}

impl StructuredLog for UnitFinished<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("unit_finished", span_name = name, unit = self.unit)
    }
}

/// A readable unit delivered its last chunk.
pub struct UnitEnded<'a> {
    pub unit: &'a str,
}

impl Display for UnitEnded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit '{}' reached end of data", self.unit)
    }
}

impl StructuredLog for UnitEnded<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("unit_ended", span_name = name, unit = self.unit)
    }
}

/// A unit was destroyed from outside, optionally with an error.
///
/// # Log Level
/// `info!` without an error, `warn!` with one
pub struct UnitDestroyed<'a> {
    pub unit: &'a str,
    pub error: Option<&'a UnitError>,
}

impl Display for UnitDestroyed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            None => write!(f, "Unit '{}' destroyed", self.unit),
            Some(error) => write!(f, "Unit '{}' destroyed with error: {}", self.unit, error),
        }
    }
}

impl StructuredLog for UnitDestroyed<'_> {
    fn log(&self) {
        match self.error {
            None => tracing::info!(unit = self.unit, "{}", self),
            Some(error) => tracing::warn!(unit = self.unit, error = %error, "{}", self),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "unit_destroyed",
            span_name = name,
            unit = self.unit,
            with_error = self.error.is_some(),
        )
    }
}

/// A byte-mode unit received an item chunk.
///
/// # Log Level
/// `warn!` - The unit fails right after
pub struct ChunkRejected<'a> {
    pub unit: &'a str,
    pub found: &'a str,
}

impl Display for ChunkRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unit '{}' rejected a {} chunk in byte mode",
            self.unit, self.found
        )
    }
}

impl StructuredLog for ChunkRejected<'_> {
    fn log(&self) {
        tracing::warn!(unit = self.unit, found = self.found, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "chunk_rejected",
            span_name = name,
            unit = self.unit,
            found = self.found,
        )
    }
}

/// An event listener fell behind and lost the oldest events.
pub struct EventsLagged<'a> {
    pub unit: &'a str,
    pub skipped: u64,
}

impl Display for EventsLagged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Listener on '{}' fell behind, {} events skipped",
            self.unit, self.skipped
        )
    }
}

impl StructuredLog for EventsLagged<'_> {
    fn log(&self) {
        tracing::warn!(unit = self.unit, skipped = self.skipped, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "events_lagged",
            span_name = name,
            unit = self.unit,
            skipped = self.skipped,
        )
    }
}

/// A transform produced output for one chunk.
///
/// # Example
/// ```
/// use the_conduit::observability::messages::unit::ChunkTransformed;
/// use std::time::Duration;
///
/// let msg = ChunkTransformed {
///     unit: "change_text_case",
///     input_size: 5,
///     output_size: 5,
///     duration: Duration::from_micros(12),
/// };
///
/// tracing::trace!("{}", msg);
/// ```
pub struct ChunkTransformed<'a> {
    pub unit: &'a str,
    pub input_size: usize,
    pub output_size: usize,
    pub duration: std::time::Duration,
}

impl Display for ChunkTransformed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unit '{}' transformed chunk: input={} bytes, output={} bytes, duration={:?}",
            self.unit, self.input_size, self.output_size, self.duration
        )
    }
}

impl StructuredLog for ChunkTransformed<'_> {
    fn log(&self) {
        tracing::trace!(
            unit = self.unit,
            input_size = self.input_size,
            output_size = self.output_size,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "chunk_transformed",
            span_name = name,
            unit = self.unit,
            input_size = self.input_size,
            output_size = self.output_size,
        )
    }
}
