// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tasks that drive each kind of unit.
//!
//! A driver owns the unit's implementation, its input receiver and its output
//! sender. It talks to the outside world only through the channels and the
//! unit's `EventHub`, so dropping every `Unit` handle lets it wind down.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::UnitError;
use crate::observability::messages::{
    unit::{ChunkRejected, UnitEnded, UnitFailed, UnitFinished},
    StructuredLog,
};
use crate::traits::{Sink, Source, Transform};
use crate::units::event::EventHub;
use crate::units::io::{FlowControl, Frame};
use crate::units::{Chunk, StreamMode};

/// Everything a driver needs besides its channels
pub(crate) struct UnitContext {
    pub name: Arc<str>,
    pub hub: Arc<EventHub>,
    pub cancel: CancellationToken,
    pub mode: StreamMode,
}

impl UnitContext {
    fn fail(&self, error: UnitError) {
        UnitFailed {
            unit: &self.name,
            error: &error,
        }
        .log();
        self.hub.error(error);
        self.hub.close();
    }

    fn check(&self, chunk: &Chunk) -> Result<(), UnitError> {
        if self.mode.accepts(chunk) {
            return Ok(());
        }
        ChunkRejected {
            unit: &self.name,
            found: chunk.kind_name(),
        }
        .log();
        Err(UnitError::invalid_chunk(&self.name, chunk.kind_name()))
    }

    fn end_readable(&self) {
        self.hub.mark_clean();
        UnitEnded { unit: &self.name }.log();
        self.hub.close();
    }

    fn finish(&self) {
        self.hub.finish();
        UnitFinished { unit: &self.name }.log();
        self.hub.close();
    }
}

enum Delivery {
    Delivered,
    /// The outlet's owner dropped it; nothing will read further output
    ConsumerGone,
    Cancelled,
}

async fn deliver(out: &mpsc::Sender<Frame>, frame: Frame, cancel: &CancellationToken) -> Delivery {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Delivery::Cancelled,
        sent = out.send(frame) => match sent {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::ConsumerGone,
        },
    }
}

/// Output half of a duplex driver; keeps consuming input after the reader left
struct Downstream {
    out: mpsc::Sender<Frame>,
    open: bool,
}

impl Downstream {
    /// Returns false when the unit was destroyed while waiting for capacity
    async fn push(&mut self, frame: Frame, cancel: &CancellationToken) -> bool {
        if !self.open {
            return true;
        }
        match deliver(&self.out, frame, cancel).await {
            Delivery::Delivered => true,
            Delivery::ConsumerGone => {
                self.open = false;
                true
            }
            Delivery::Cancelled => false,
        }
    }
}

pub(crate) async fn drive_source(
    mut source: Box<dyn Source>,
    out: mpsc::Sender<Frame>,
    ctx: UnitContext,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            next = source.produce() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if let Err(error) = ctx.check(&chunk) {
                    ctx.fail(error);
                    return;
                }
                match deliver(&out, Frame::Chunk(chunk), &ctx.cancel).await {
                    Delivery::Delivered => {}
                    Delivery::Cancelled => return,
                    Delivery::ConsumerGone => {
                        ctx.hub.close();
                        return;
                    }
                }
            }
            Some(Err(error)) => {
                ctx.fail(error);
                return;
            }
            None => {
                let (end, consumed) = Frame::acknowledged_end();
                if let Delivery::Cancelled = deliver(&out, end, &ctx.cancel).await {
                    return;
                }
                // Ended only once the reader has pulled everything
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => {}
                    consumed = consumed => match consumed {
                        Ok(()) => ctx.end_readable(),
                        Err(_) => ctx.hub.close(),
                    },
                }
                return;
            }
        }
    }
}

/// Push-mode production: one chunk per scheduling turn, no waiting on the
/// consumer, stopping only while the flow control is paused.
pub(crate) async fn drive_legacy_source(
    mut source: Box<dyn Source>,
    out: mpsc::UnboundedSender<Frame>,
    flow: FlowControl,
    ctx: UnitContext,
) {
    loop {
        if flow.is_paused() {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return,
                _ = flow.wait_resumed() => {}
            }
        }

        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            next = source.produce() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if let Err(error) = ctx.check(&chunk) {
                    ctx.fail(error);
                    return;
                }
                if out.send(Frame::Chunk(chunk)).is_err() {
                    ctx.hub.close();
                    return;
                }
            }
            Some(Err(error)) => {
                ctx.fail(error);
                return;
            }
            None => {
                let _ = out.send(Frame::end());
                ctx.end_readable();
                return;
            }
        }

        tokio::task::yield_now().await;
    }
}

pub(crate) async fn drive_transform(
    mut transform: Box<dyn Transform>,
    mut input: mpsc::Receiver<Frame>,
    out: mpsc::Sender<Frame>,
    ctx: UnitContext,
) {
    let mut downstream = Downstream { out, open: true };

    loop {
        let frame = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            frame = input.recv() => frame,
        };

        match frame {
            Some(Frame::Chunk(chunk)) => {
                if let Err(error) = ctx.check(&chunk) {
                    ctx.fail(error);
                    return;
                }
                match transform.transform(chunk).await {
                    Ok(Some(output)) => {
                        if !downstream.push(Frame::Chunk(output), &ctx.cancel).await {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => {
                        ctx.fail(error);
                        return;
                    }
                }
            }
            Some(Frame::End(_)) => {
                let trailing = match transform.flush().await {
                    Ok(trailing) => trailing,
                    Err(error) => {
                        ctx.fail(error);
                        return;
                    }
                };
                for output in trailing {
                    if !downstream.push(Frame::Chunk(output), &ctx.cancel).await {
                        return;
                    }
                }
                if !downstream.push(Frame::end(), &ctx.cancel).await {
                    return;
                }
                ctx.finish();
                return;
            }
            None => {
                ctx.hub.close();
                return;
            }
        }
    }
}

pub(crate) async fn drive_sink(
    mut sink: Box<dyn Sink>,
    mut input: mpsc::Receiver<Frame>,
    ctx: UnitContext,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            frame = input.recv() => frame,
        };

        match frame {
            Some(Frame::Chunk(chunk)) => {
                let consumed = match ctx.check(&chunk) {
                    Ok(()) => sink.consume(chunk).await,
                    Err(error) => Err(error),
                };
                if let Err(error) = consumed {
                    ctx.fail(error);
                    return;
                }
            }
            Some(Frame::End(_)) => {
                match sink.close().await {
                    Ok(()) => ctx.finish(),
                    Err(error) => ctx.fail(error),
                }
                return;
            }
            None => {
                ctx.hub.close();
                return;
            }
        }
    }
}

/// Accepts and discards input, never produces; the outlet stays open until
/// the input ends or the unit is destroyed.
pub(crate) async fn drive_idle(
    input: Option<mpsc::Receiver<Frame>>,
    out: Option<mpsc::Sender<Frame>>,
    ctx: UnitContext,
) {
    let Some(mut input) = input else {
        ctx.cancel.cancelled().await;
        return;
    };

    loop {
        let frame = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return,
            frame = input.recv() => frame,
        };

        match frame {
            Some(Frame::Chunk(_)) => {}
            Some(Frame::End(_)) => {
                if let Some(out) = &out {
                    if let Delivery::Cancelled = deliver(out, Frame::end(), &ctx.cancel).await {
                        return;
                    }
                }
                ctx.finish();
                return;
            }
            None => {
                ctx.hub.close();
                return;
            }
        }
    }
}

/// The neutral unit: forwards every chunk unchanged.
pub(crate) struct Passthrough;

#[async_trait::async_trait]
impl Transform for Passthrough {
    async fn transform(&mut self, chunk: Chunk) -> Result<Option<Chunk>, UnitError> {
        Ok(Some(chunk))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
