// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout The Conduit. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep structured fields and human-readable text in one place
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::composition` - pipeline assembly, linking, error relay and settlement
//! * `messages::unit` - individual unit lifecycle and chunk handling
//!
//! # Usage
//!
//! ```rust
//! use the_conduit::observability::messages::{unit::UnitFinished, StructuredLog};
//!
//! UnitFinished { unit: "collector" }.log();
//! ```

pub mod messages;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
