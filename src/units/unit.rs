// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_HIGH_WATER_MARK, MIN_HIGH_WATER_MARK};
use crate::config::ComposeOptions;
use crate::errors::UnitError;
use crate::observability::messages::{unit::UnitDestroyed, StructuredLog};
use crate::traits::{Sink, Source, Transform};
use crate::units::event::{EventHub, Events};
use crate::units::io::{FlowControl, LegacyOutlet, Outlet, Reader, Writer};
use crate::units::runtime::{self, Passthrough, UnitContext};
use crate::units::Chunk;

/// Read/write capability of a unit, fixed when the unit is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ReadOnly,
    WriteOnly,
    Duplex,
    Neither,
}

impl Capability {
    pub fn from_flags(can_read: bool, can_write: bool) -> Self {
        match (can_read, can_write) {
            (true, true) => Capability::Duplex,
            (true, false) => Capability::ReadOnly,
            (false, true) => Capability::WriteOnly,
            (false, false) => Capability::Neither,
        }
    }

    pub fn can_read(self) -> bool {
        matches!(self, Capability::ReadOnly | Capability::Duplex)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Capability::WriteOnly | Capability::Duplex)
    }
}

/// How a readable unit produces its output.
///
/// * `Standard` - pull-based with a bounded buffer; production waits for the reader
/// * `Legacy` - push-based; production only stops while explicitly paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadContract {
    Standard,
    Legacy,
}

/// Item-oriented or byte-oriented chunk handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Object,
    Bytes,
}

impl StreamMode {
    pub fn from_object_mode(object_mode: bool) -> Self {
        if object_mode {
            StreamMode::Object
        } else {
            StreamMode::Bytes
        }
    }

    /// Byte mode refuses item-mode chunks
    pub fn accepts(self, chunk: &Chunk) -> bool {
        self == StreamMode::Object || !chunk.is_object()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Source,
    LegacySource,
    Transform,
    Sink,
    Passthrough,
    Idle,
    /// Synthesized by composition: a duplex facade or a standardized reader
    Wrapper,
}

/// Per-unit settings.
///
/// # Fields
/// * `name` - overrides the implementation's name in logs
/// * `high_water_mark` - capacity of the unit's input and output buffers
/// * `mode` - item or byte handling
/// * `bubble_errors` - recorded on wrappers built by composition
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSettings {
    pub name: Option<String>,
    pub high_water_mark: usize,
    pub mode: StreamMode,
    pub bubble_errors: bool,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            name: None,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            mode: StreamMode::Object,
            bubble_errors: false,
        }
    }
}

impl From<&ComposeOptions> for UnitSettings {
    fn from(options: &ComposeOptions) -> Self {
        Self {
            name: None,
            high_water_mark: options.high_water_mark,
            mode: StreamMode::from_object_mode(options.object_mode),
            bubble_errors: options.bubble_errors,
        }
    }
}

impl UnitSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = high_water_mark;
        self
    }

    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    fn capacity(&self) -> usize {
        self.high_water_mark.max(MIN_HIGH_WATER_MARK)
    }

    fn resolve_name(&self, fallback: &str) -> Arc<str> {
        self.name.as_deref().unwrap_or(fallback).into()
    }
}

struct UnitInner {
    name: Arc<str>,
    kind: UnitKind,
    capability: Capability,
    read_contract: ReadContract,
    settings: UnitSettings,
    writer: Option<Writer>,
    outlet: Mutex<Option<Outlet>>,
    hub: Arc<EventHub>,
    cancel: CancellationToken,
    /// Units destroyed along with this one
    delegates: Mutex<Vec<Unit>>,
}

/// A stream-like processing endpoint.
///
/// `Unit` is a handle: clones refer to the same endpoint, and `same_as`
/// compares identity. Building a unit spawns the task that drives it, so every
/// constructor must run inside a Tokio runtime.
#[derive(Clone)]
pub struct Unit {
    inner: Arc<UnitInner>,
}

struct Parts {
    name: Arc<str>,
    kind: UnitKind,
    capability: Capability,
    read_contract: ReadContract,
    settings: UnitSettings,
    writer: Option<Writer>,
    outlet: Option<Outlet>,
}

impl Unit {
    fn assemble(parts: Parts) -> Self {
        let hub = EventHub::new(parts.name.clone());
        Self {
            inner: Arc::new(UnitInner {
                name: parts.name,
                kind: parts.kind,
                capability: parts.capability,
                read_contract: parts.read_contract,
                settings: parts.settings,
                writer: parts.writer,
                outlet: Mutex::new(parts.outlet),
                hub,
                cancel: CancellationToken::new(),
                delegates: Mutex::new(Vec::new()),
            }),
        }
    }

    fn context(&self) -> UnitContext {
        UnitContext {
            name: self.inner.name.clone(),
            hub: self.inner.hub.clone(),
            cancel: self.inner.cancel.clone(),
            mode: self.inner.settings.mode,
        }
    }

    /// Read-only unit producing from `source`
    pub fn source<S: Source + 'static>(source: S) -> Self {
        Self::source_with(source, UnitSettings::default())
    }

    pub fn source_with<S: Source + 'static>(source: S, settings: UnitSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.capacity());
        let unit = Self::assemble(Parts {
            name: settings.resolve_name(source.name()),
            kind: UnitKind::Source,
            capability: Capability::ReadOnly,
            read_contract: ReadContract::Standard,
            settings,
            writer: None,
            outlet: Some(Outlet::Standard(rx)),
        });
        tokio::spawn(runtime::drive_source(Box::new(source), tx, unit.context()));
        unit
    }

    /// Read-only unit that pushes from `source` without waiting for a reader
    pub fn legacy_source<S: Source + 'static>(source: S) -> Self {
        Self::legacy_source_with(source, UnitSettings::default())
    }

    pub fn legacy_source_with<S: Source + 'static>(source: S, settings: UnitSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let flow = FlowControl::new();
        let unit = Self::assemble(Parts {
            name: settings.resolve_name(source.name()),
            kind: UnitKind::LegacySource,
            capability: Capability::ReadOnly,
            read_contract: ReadContract::Legacy,
            settings,
            writer: None,
            outlet: Some(Outlet::Legacy(LegacyOutlet {
                rx,
                flow: flow.clone(),
            })),
        });
        tokio::spawn(runtime::drive_legacy_source(
            Box::new(source),
            tx,
            flow,
            unit.context(),
        ));
        unit
    }

    /// Duplex unit mapping each chunk through `transform`
    pub fn transform<T: Transform + 'static>(transform: T) -> Self {
        Self::transform_with(transform, UnitSettings::default())
    }

    pub fn transform_with<T: Transform + 'static>(transform: T, settings: UnitSettings) -> Self {
        Self::duplex(Box::new(transform), UnitKind::Transform, settings)
    }

    /// Write-only unit feeding `sink`
    pub fn sink<S: Sink + 'static>(sink: S) -> Self {
        Self::sink_with(sink, UnitSettings::default())
    }

    pub fn sink_with<S: Sink + 'static>(sink: S, settings: UnitSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.capacity());
        let name = settings.resolve_name(sink.name());
        let unit = Self::assemble(Parts {
            writer: Some(Writer::new(name.clone(), tx)),
            name,
            kind: UnitKind::Sink,
            capability: Capability::WriteOnly,
            read_contract: ReadContract::Standard,
            settings,
            outlet: None,
        });
        tokio::spawn(runtime::drive_sink(Box::new(sink), rx, unit.context()));
        unit
    }

    /// Neutral duplex unit forwarding chunks unchanged
    pub fn passthrough(options: &ComposeOptions) -> Self {
        Self::passthrough_with(UnitSettings::from(options))
    }

    pub fn passthrough_with(settings: UnitSettings) -> Self {
        Self::duplex(Box::new(Passthrough), UnitKind::Passthrough, settings)
    }

    /// Unit with arbitrary capability flags that discards input and never
    /// produces; its readable side stays open until it is destroyed.
    pub fn idle(name: impl Into<String>, capability: Capability) -> Self {
        let settings = UnitSettings::named(name);
        let name = settings.resolve_name("idle");

        let (writer, input) = if capability.can_write() {
            let (tx, rx) = mpsc::channel(settings.capacity());
            (Some(Writer::new(name.clone(), tx)), Some(rx))
        } else {
            (None, None)
        };
        let (outlet, out) = if capability.can_read() {
            let (tx, rx) = mpsc::channel(settings.capacity());
            (Some(Outlet::Standard(rx)), Some(tx))
        } else {
            (None, None)
        };

        let unit = Self::assemble(Parts {
            name,
            kind: UnitKind::Idle,
            capability,
            read_contract: ReadContract::Standard,
            settings,
            writer,
            outlet,
        });
        tokio::spawn(runtime::drive_idle(input, out, unit.context()));
        unit
    }

    fn duplex(transform: Box<dyn Transform>, kind: UnitKind, settings: UnitSettings) -> Self {
        let (in_tx, in_rx) = mpsc::channel(settings.capacity());
        let (out_tx, out_rx) = mpsc::channel(settings.capacity());
        let name = settings.resolve_name(transform.name());
        let unit = Self::assemble(Parts {
            writer: Some(Writer::new(name.clone(), in_tx)),
            name,
            kind,
            capability: Capability::Duplex,
            read_contract: ReadContract::Standard,
            settings,
            outlet: Some(Outlet::Standard(out_rx)),
        });
        tokio::spawn(runtime::drive_transform(
            transform,
            in_rx,
            out_tx,
            unit.context(),
        ));
        unit
    }

    /// A taskless facade over another unit's writer and/or outlet
    pub(crate) fn wrapper(
        name: &str,
        settings: UnitSettings,
        writer: Option<Writer>,
        outlet: Option<Outlet>,
    ) -> Self {
        Self::assemble(Parts {
            name: name.into(),
            kind: UnitKind::Wrapper,
            capability: Capability::from_flags(outlet.is_some(), writer.is_some()),
            read_contract: ReadContract::Standard,
            settings,
            writer,
            outlet,
        })
    }

    /// Destroy `unit` (without an error) whenever this unit is destroyed
    pub(crate) fn delegate_destroy(&self, unit: Unit) {
        if unit.same_as(self) {
            return;
        }
        self.inner
            .delegates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(unit);
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> UnitKind {
        self.inner.kind
    }

    pub fn capability(&self) -> Capability {
        self.inner.capability
    }

    pub fn can_read(&self) -> bool {
        self.inner.capability.can_read()
    }

    pub fn can_write(&self) -> bool {
        self.inner.capability.can_write()
    }

    pub fn read_contract(&self) -> ReadContract {
        self.inner.read_contract
    }

    pub fn settings(&self) -> &UnitSettings {
        &self.inner.settings
    }

    pub fn mode(&self) -> StreamMode {
        self.inner.settings.mode
    }

    /// Write side, when the unit is write-capable
    pub fn writer(&self) -> Option<Writer> {
        self.inner.writer.clone()
    }

    /// Take the read side; only the first caller gets it
    pub fn take_reader(&self) -> Option<Reader> {
        self.take_outlet()
            .map(|outlet| Reader::new(self.inner.name.clone(), outlet))
    }

    pub(crate) fn take_outlet(&self) -> Option<Outlet> {
        self.inner
            .outlet
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Listen to this unit's error, finish and close notifications
    pub fn subscribe(&self) -> Events {
        self.inner.hub.subscribe()
    }

    pub(crate) fn hub(&self) -> &Arc<EventHub> {
        &self.inner.hub
    }

    /// Raise an error notification on this unit without stopping it
    pub fn emit_error(&self, error: UnitError) {
        self.inner.hub.error(error);
    }

    /// Stop the unit: emit `error` if given, halt its task, then emit Close.
    /// Destroying an already closed unit does nothing. Units registered
    /// through `delegate_destroy` are destroyed next, without the error.
    pub fn destroy(&self, error: Option<UnitError>) {
        if self.inner.hub.is_closed() {
            return;
        }
        UnitDestroyed {
            unit: &self.inner.name,
            error: error.as_ref(),
        }
        .log();
        if let Some(error) = error {
            self.inner.hub.error(error);
        }
        self.inner.cancel.cancel();
        self.inner.hub.close();
        let delegates = std::mem::take(
            &mut *self
                .inner
                .delegates
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for delegate in delegates {
            delegate.destroy(None);
        }
    }

    /// Whether the unit finished its work (input consumed or output ended)
    pub fn ended_cleanly(&self) -> bool {
        self.inner.hub.ended_cleanly()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.hub.is_closed()
    }

    /// First error this unit emitted, including any relayed onto it
    pub fn first_error(&self) -> Option<UnitError> {
        self.inner.hub.first_error()
    }

    /// Identity comparison: true only for handles to the same unit
    pub fn same_as(&self, other: &Unit) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .field("capability", &self.inner.capability)
            .field("read_contract", &self.inner.read_contract)
            .finish()
    }
}
