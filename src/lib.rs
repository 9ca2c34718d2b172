// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // unit implementations
pub mod config;     // options + pipeline files
pub mod engine;     // composition
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // source / transform / sink abstractions
pub mod units;      // unit handles, chunks, events

pub use engine::{compose, compose_args, ComposeArg, Composer, CompositeHandle, OnComplete, Thenable};
pub use units::{Chunk, Unit};
