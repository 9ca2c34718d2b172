// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Await-capable facade over a composed pipeline.
//!
//! A dedicated observer task records the pipeline's settlement in a `watch`
//! channel. Every access creates a fresh deferred computation with its own
//! receiver, so accesses made before or after settlement all see the same
//! outcome, and none of them touches the completion callback or the
//! composite's event bus.

use std::future::{Future, IntoFuture};
use std::ops::Deref;
use std::pin::Pin;

use tokio::sync::watch;

use crate::engine::compose::CompositeHandle;
use crate::engine::tracker::{self, CompletionSignal, Observation, Settlement};
use crate::errors::UnitError;

/// One independent wait on a pipeline's outcome
pub type Deferred = Pin<Box<dyn Future<Output = Result<(), UnitError>> + Send + 'static>>;

/// Creates deferred computations over one pipeline's settlement
#[derive(Clone)]
pub struct DeferredFactory {
    signal: watch::Receiver<CompletionSignal>,
}

impl DeferredFactory {
    /// Start observing; `None` means an empty pipeline, settled next turn
    pub(crate) fn spawn(observation: Option<Observation>, composite: &str) -> Self {
        let (tx, rx) = watch::channel(CompletionSignal::Pending);
        let composite = composite.to_string();

        tokio::spawn(async move {
            let outcome = match observation {
                Some(observation) => observation.settlement().await,
                None => Settlement::Success,
            };
            tx.send_if_modified(|signal| tracker::record(signal, &composite, outcome));
        });

        Self { signal: rx }
    }

    /// A fresh deferred computation resolving with the first outcome
    pub fn create(&self) -> Deferred {
        let mut signal = self.signal.clone();
        Box::pin(async move {
            let outcome = signal
                .wait_for(CompletionSignal::is_settled)
                .await
                .ok()
                .and_then(|settled| settled.settlement().map(Settlement::to_result));
            match outcome {
                Some(result) => result,
                // Observer torn down before settling, e.g. at runtime shutdown
                None => std::future::pending().await,
            }
        })
    }

    /// Current state without waiting
    pub fn current(&self) -> CompletionSignal {
        self.signal.borrow().clone()
    }
}

/// A composite handle that can also be awaited.
///
/// Dereferences to the [`CompositeHandle`], so it is used as a unit as usual;
/// `(&thenable).await`, `then`, `catch` and `finally` each wait independently.
pub struct Thenable {
    handle: CompositeHandle,
    factory: DeferredFactory,
}

impl Thenable {
    pub(crate) fn new(handle: CompositeHandle, factory: DeferredFactory) -> Self {
        Self { handle, factory }
    }

    pub fn handle(&self) -> &CompositeHandle {
        &self.handle
    }

    pub fn into_handle(self) -> CompositeHandle {
        self.handle
    }

    pub fn factory(&self) -> &DeferredFactory {
        &self.factory
    }

    pub fn deferred(&self) -> Deferred {
        self.factory.create()
    }

    /// Run `on_success` after a successful settle
    pub async fn then<F, T>(&self, on_success: F) -> Result<T, UnitError>
    where
        F: FnOnce() -> T,
    {
        self.deferred().await.map(|()| on_success())
    }

    /// Run `on_failure` with the error after a failed settle; `None` on success
    pub async fn catch<F, T>(&self, on_failure: F) -> Option<T>
    where
        F: FnOnce(UnitError) -> T,
    {
        self.deferred().await.err().map(on_failure)
    }

    /// Run `on_settled` either way, then pass the outcome through
    pub async fn finally<F>(&self, on_settled: F) -> Result<(), UnitError>
    where
        F: FnOnce(),
    {
        let outcome = self.deferred().await;
        on_settled();
        outcome
    }
}

impl Deref for Thenable {
    type Target = CompositeHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl IntoFuture for &Thenable {
    type Output = Result<(), UnitError>;
    type IntoFuture = Deferred;

    fn into_future(self) -> Self::IntoFuture {
        self.factory.create()
    }
}

impl IntoFuture for Thenable {
    type Output = Result<(), UnitError>;
    type IntoFuture = Deferred;

    fn into_future(self) -> Self::IntoFuture {
        self.factory.create()
    }
}
