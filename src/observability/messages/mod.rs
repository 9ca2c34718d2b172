// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit itself at the right level with its fields
//! attached.
//!
//! # Organization
//!
//! * `composition` - pipeline assembly, links, relayed errors and settlement
//! * `unit` - unit lifecycle, rejected chunks and transform timings
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_conduit::observability::messages::composition::LinkEstablished;
//!
//! let msg = LinkEstablished {
//!     from: "reader",
//!     to: "upper",
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

use tracing::Span;

pub mod composition;
pub mod unit;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
