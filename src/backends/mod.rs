// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Unit implementations for The Conduit.
//!
//! # Local Backend
//! In-process text units usable from configuration:
//! - **Transforms**: case conversion, reversal, prefix/suffix addition
//! - **Sources**: fixed lists of chunks
//! - **Sinks**: collectors that keep every chunk for inspection
//!
//! ## Stub Backend (Test-Only)
//! Failing transforms, counting sources and slow sinks for exercising error
//! relay and backpressure. Not available in production builds.

pub mod local;
#[cfg(test)]
pub mod stub;
