// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline composition events.
//!
//! This module contains message types for logging events related to:
//! * Pipeline classification and composite construction
//! * Links between adjacent units and backpressure across them
//! * Error relay from members onto the composite
//! * Pipeline settlement

use crate::errors::UnitError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A pipeline was composed into a single handle.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_conduit::observability::messages::composition::PipelineComposed;
///
/// let msg = PipelineComposed {
///     composite: "upper",
///     shape: "Duplex",
///     members: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineComposed<'a> {
    pub composite: &'a str,
    pub shape: &'a str,
    pub members: usize,
}

impl Display for PipelineComposed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Composed {} units into '{}' ({} shape)",
            self.members, self.composite, self.shape
        )
    }
}

impl StructuredLog for PipelineComposed<'_> {
    fn log(&self) {
        tracing::info!(
            composite = self.composite,
            shape = self.shape,
            members = self.members,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "composition",
            span_name = name,
            composite = self.composite,
            shape = self.shape,
            members = self.members,
        )
    }
}

/// Data now flows from one unit into the next.
///
/// # Log Level
/// `debug!` - Detailed wiring information
pub struct LinkEstablished<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl Display for LinkEstablished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Linked '{}' -> '{}'", self.from, self.to)
    }
}

impl StructuredLog for LinkEstablished<'_> {
    fn log(&self) {
        tracing::debug!(from = self.from, to = self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("link", span_name = name, from = self.from, to = self.to)
    }
}

/// An adjacent pair could not be linked; the pipeline continues without it.
///
/// # Log Level
/// `warn!` - Unexpected but non-fatal
///
/// # Example
/// ```
/// use the_conduit::observability::messages::composition::LinkSkipped;
///
/// let msg = LinkSkipped {
///     from: "collector",
///     to: "upper",
///     reason: "upstream has no readable side",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct LinkSkipped<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub reason: &'a str,
}

impl Display for LinkSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipped link '{}' -> '{}': {}",
            self.from, self.to, self.reason
        )
    }
}

impl StructuredLog for LinkSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            from = self.from,
            to = self.to,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "link_skipped",
            span_name = name,
            from = self.from,
            to = self.to,
            reason = self.reason,
        )
    }
}

/// The upstream of a link went away without ending its output; the
/// downstream member is destroyed.
///
/// # Log Level
/// `warn!` - The pipeline will close without finishing
pub struct LinkAborted<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl Display for LinkAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Link '{}' -> '{}' aborted: upstream closed without ending its output",
            self.from, self.to
        )
    }
}

impl StructuredLog for LinkAborted<'_> {
    fn log(&self) {
        tracing::warn!(from = self.from, to = self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("link_aborted", span_name = name, from = self.from, to = self.to)
    }
}

/// A member's error was re-raised on the composite.
///
/// # Log Level
/// `debug!` - The originating failure is already logged at `error!`
pub struct ErrorRelayed<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub error: &'a UnitError,
}

impl Display for ErrorRelayed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Relayed error from '{}' to '{}': {}",
            self.from, self.to, self.error
        )
    }
}

impl StructuredLog for ErrorRelayed<'_> {
    fn log(&self) {
        tracing::debug!(
            from = self.from,
            to = self.to,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "error_relay",
            span_name = name,
            from = self.from,
            to = self.to,
            error = %self.error,
        )
    }
}

/// The pipeline settled, with the first error if it failed.
///
/// # Log Level
/// `info!` on success, `warn!` on failure
pub struct PipelineSettled<'a> {
    pub composite: &'a str,
    pub error: Option<&'a UnitError>,
}

impl Display for PipelineSettled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            None => write!(f, "Pipeline '{}' completed", self.composite),
            Some(error) => write!(f, "Pipeline '{}' failed: {}", self.composite, error),
        }
    }
}

impl StructuredLog for PipelineSettled<'_> {
    fn log(&self) {
        match self.error {
            None => tracing::info!(composite = self.composite, "{}", self),
            Some(error) => tracing::warn!(
                composite = self.composite,
                error = %error,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "settlement",
            span_name = name,
            composite = self.composite,
            failed = self.error.is_some(),
        )
    }
}

/// A downstream buffer filled up and the upstream side was paused.
///
/// # Log Level
/// `trace!` - Happens on every saturated write
pub struct BackpressureEngaged<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl Display for BackpressureEngaged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pausing '{}': '{}' is saturated", self.from, self.to)
    }
}

impl StructuredLog for BackpressureEngaged<'_> {
    fn log(&self) {
        tracing::trace!(from = self.from, to = self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "backpressure",
            span_name = name,
            from = self.from,
            to = self.to,
        )
    }
}

/// The downstream buffer drained and the upstream side resumed.
///
/// # Log Level
/// `trace!` - Happens on every drain
pub struct BackpressureReleased<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl Display for BackpressureReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Resuming '{}': '{}' drained", self.from, self.to)
    }
}

impl StructuredLog for BackpressureReleased<'_> {
    fn log(&self) {
        tracing::trace!(from = self.from, to = self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "backpressure_released",
            span_name = name,
            from = self.from,
            to = self.to,
        )
    }
}

/// A compose argument was neither a unit, a unit list, nor in a trailing slot.
///
/// # Log Level
/// `warn!` - The argument is ignored
pub struct MisplacedArgument<'a> {
    pub position: usize,
    pub kind: &'a str,
}

impl Display for MisplacedArgument<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring {} at argument position {}: only allowed in trailing position",
            self.kind, self.position
        )
    }
}

impl StructuredLog for MisplacedArgument<'_> {
    fn log(&self) {
        tracing::warn!(position = self.position, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "misplaced_argument",
            span_name = name,
            position = self.position,
            kind = self.kind,
        )
    }
}
