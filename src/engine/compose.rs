// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline composition entry points.
//!
//! Composing a pipeline runs four steps in order:
//!
//! 1. **Classification**: pick the composite shape from the head and tail
//! 2. **Linking**: forward every unit's output into the next unit's input
//! 3. **Error aggregation**: relay member errors onto the composite
//! 4. **Completion tracking**: settle once and run the optional callback
//!
//! Composition never fails and never settles inside the call: every
//! notification, including the empty pipeline's callback, arrives on a later
//! scheduling turn. It must run inside a Tokio runtime.
//!
//! # Example
//! ```rust
//! use the_conduit::backends::local::{ChangeTextCaseTransform, CollectorSink, IterSource};
//! use the_conduit::engine::Composer;
//! use the_conduit::units::Unit;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (sink, collected) = CollectorSink::new();
//! let pipeline = Composer::new()
//!     .unit(Unit::source(IterSource::texts(["hello"])))
//!     .unit(Unit::transform(ChangeTextCaseTransform::upper()))
//!     .unit(Unit::sink(sink))
//!     .compose_deferred();
//!
//! (&pipeline).await.unwrap();
//! assert_eq!(collected.texts(), vec!["HELLO"]);
//! # }
//! ```

use crate::config::ComposeOptions;
use crate::engine::aggregator::aggregate_errors;
use crate::engine::classifier::{self, classify, CompositeShape};
use crate::engine::deferred::{DeferredFactory, Thenable};
use crate::engine::linker::link_pipeline;
use crate::engine::tracker::{self, Observation, OnComplete};
use crate::errors::UnitError;
use crate::observability::messages::{
    composition::{MisplacedArgument, PipelineComposed},
    StructuredLog,
};
use crate::units::{Capability, Events, Reader, Unit, Writer};

/// The single handle standing in for a composed pipeline
pub struct CompositeHandle {
    composite: Unit,
    pipeline: Vec<Unit>,
    shape: CompositeShape,
    options: ComposeOptions,
}

impl CompositeHandle {
    /// The composite unit; for identity shapes this is the member itself
    pub fn unit(&self) -> &Unit {
        &self.composite
    }

    pub fn into_unit(self) -> Unit {
        self.composite
    }

    pub fn shape(&self) -> CompositeShape {
        self.shape
    }

    /// The effective pipeline; an empty input becomes one passthrough
    pub fn pipeline(&self) -> &[Unit] {
        &self.pipeline
    }

    pub fn head(&self) -> &Unit {
        &self.pipeline[0]
    }

    pub fn tail(&self) -> &Unit {
        &self.pipeline[self.pipeline.len() - 1]
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub fn capability(&self) -> Capability {
        self.composite.capability()
    }

    pub fn can_read(&self) -> bool {
        self.composite.can_read()
    }

    pub fn can_write(&self) -> bool {
        self.composite.can_write()
    }

    pub fn writer(&self) -> Option<Writer> {
        self.composite.writer()
    }

    pub fn take_reader(&self) -> Option<Reader> {
        self.composite.take_reader()
    }

    /// Errors from every member, plus the tail's finish and close
    pub fn subscribe(&self) -> Events {
        self.composite.subscribe()
    }

    pub fn destroy(&self, error: Option<UnitError>) {
        self.composite.destroy(error);
    }
}

impl From<CompositeHandle> for Unit {
    fn from(handle: CompositeHandle) -> Self {
        handle.composite
    }
}

/// Compose `units` with default options and no callback
pub fn compose(units: impl IntoIterator<Item = Unit>) -> CompositeHandle {
    Composer::new().units(units).compose()
}

/// Builder for a composition with options and a completion callback
#[derive(Debug, Default)]
pub struct Composer {
    units: Vec<Unit>,
    options: ComposeOptions,
    on_complete: Option<OnComplete>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, unit: impl Into<Unit>) -> Self {
        self.units.push(unit.into());
        self
    }

    pub fn units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.units.extend(units);
        self
    }

    pub fn options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<UnitError>) + Send + 'static,
    {
        self.on_complete = Some(OnComplete::new(callback));
        self
    }

    pub fn compose(self) -> CompositeHandle {
        let Composer {
            units,
            options,
            on_complete,
        } = self;

        let shape = classify(&units);
        let pipeline = if units.is_empty() {
            vec![Unit::passthrough(&options)]
        } else {
            units
        };

        let composite = classifier::realize(shape, &pipeline, &options);
        link_pipeline(&pipeline);
        aggregate_errors(&pipeline, &composite);

        let handle = CompositeHandle {
            composite,
            pipeline,
            shape,
            options,
        };

        if let Some(on_complete) = on_complete {
            if shape == CompositeShape::Empty {
                tracker::track_empty(handle.composite.name(), on_complete);
            } else {
                tracker::track(observe(&handle), on_complete);
            }
        }

        PipelineComposed {
            composite: handle.composite.name(),
            shape: shape.as_str(),
            members: handle.pipeline.len(),
        }
        .log();

        handle
    }

    /// Compose and attach the await-capable facade
    pub fn compose_deferred(self) -> Thenable {
        let handle = self.compose();
        let factory = observe_deferred(&handle);
        Thenable::new(handle, factory)
    }
}

fn observe(handle: &CompositeHandle) -> Observation {
    Observation::new(&handle.composite, handle.tail(), &handle.options)
}

fn observe_deferred(handle: &CompositeHandle) -> DeferredFactory {
    let observation = (handle.shape != CompositeShape::Empty).then(|| observe(handle));
    DeferredFactory::spawn(observation, handle.composite.name())
}

/// One argument of the loosely typed call form; see [`compose_args`]
#[derive(Debug)]
pub enum ComposeArg {
    Unit(Unit),
    Units(Vec<Unit>),
    Options(ComposeOptions),
    OnComplete(OnComplete),
}

impl ComposeArg {
    fn kind_name(&self) -> &'static str {
        match self {
            ComposeArg::Unit(_) => "unit",
            ComposeArg::Units(_) => "unit list",
            ComposeArg::Options(_) => "options",
            ComposeArg::OnComplete(_) => "completion callback",
        }
    }
}

impl From<Unit> for ComposeArg {
    fn from(unit: Unit) -> Self {
        ComposeArg::Unit(unit)
    }
}

impl From<CompositeHandle> for ComposeArg {
    fn from(handle: CompositeHandle) -> Self {
        ComposeArg::Unit(handle.into_unit())
    }
}

impl From<Vec<Unit>> for ComposeArg {
    fn from(units: Vec<Unit>) -> Self {
        ComposeArg::Units(units)
    }
}

impl From<ComposeOptions> for ComposeArg {
    fn from(options: ComposeOptions) -> Self {
        ComposeArg::Options(options)
    }
}

impl From<OnComplete> for ComposeArg {
    fn from(on_complete: OnComplete) -> Self {
        ComposeArg::OnComplete(on_complete)
    }
}

/// Turn a loosely typed argument list into a builder.
///
/// A trailing callback is taken first, then trailing options. Units and unit
/// lists are flattened in order. Options or callbacks anywhere else are
/// ignored with a warning.
pub fn normalize_args(mut args: Vec<ComposeArg>) -> Composer {
    let mut composer = Composer::new();

    if matches!(args.last(), Some(ComposeArg::OnComplete(_))) {
        if let Some(ComposeArg::OnComplete(on_complete)) = args.pop() {
            composer.on_complete = Some(on_complete);
        }
    }
    if matches!(args.last(), Some(ComposeArg::Options(_))) {
        if let Some(ComposeArg::Options(options)) = args.pop() {
            composer.options = options;
        }
    }

    for (position, arg) in args.into_iter().enumerate() {
        match arg {
            ComposeArg::Unit(unit) => composer.units.push(unit),
            ComposeArg::Units(units) => composer.units.extend(units),
            misplaced => MisplacedArgument {
                position,
                kind: misplaced.kind_name(),
            }
            .log(),
        }
    }

    composer
}

/// Compose from a loosely typed argument list
pub fn compose_args(args: Vec<ComposeArg>) -> CompositeHandle {
    normalize_args(args).compose()
}

/// Compose from any mix of units, unit lists, trailing options and a
/// trailing [`OnComplete`].
///
/// ```rust
/// use the_conduit::backends::local::ChangeTextCaseTransform;
/// use the_conduit::compose;
/// use the_conduit::config::ComposeOptions;
/// use the_conduit::units::Unit;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let upper = Unit::transform(ChangeTextCaseTransform::upper());
/// let handle = compose!(vec![upper], ComposeOptions::default());
/// assert!(handle.can_read() && handle.can_write());
/// # }
/// ```
#[macro_export]
macro_rules! compose {
    () => {
        $crate::engine::compose_args(::std::vec::Vec::new())
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::engine::compose_args(::std::vec![$($crate::engine::ComposeArg::from($arg)),+])
    };
}
