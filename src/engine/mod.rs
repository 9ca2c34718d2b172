// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline composition engine.
//!
//! * `classifier` - composite shape selection and construction
//! * `linker` - backpressured forwarding between adjacent units
//! * `aggregator` - member error relay onto the composite
//! * `tracker` - one-time settlement and the completion callback
//! * `deferred` - the await-capable facade
//! * `compose` - entry points tying the above together

mod aggregator;
mod classifier;
mod compose;
mod deferred;
mod linker;
mod tracker;

#[cfg(test)]
mod integration_tests;

pub use classifier::{classify, CompositeShape};
pub use compose::{compose, compose_args, normalize_args, ComposeArg, Composer, CompositeHandle};
pub use deferred::{Deferred, DeferredFactory, Thenable};
pub use tracker::{CompletionSignal, OnComplete, Settlement};
