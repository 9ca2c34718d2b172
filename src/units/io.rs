// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data and backpressure plumbing between units.
//!
//! A unit's input is a bounded channel: a full channel is the "cannot accept
//! more" signal and a freed slot is the ready/drain signal. A unit's output is
//! an `Outlet`, owned by exactly one consumer. Standard outlets are bounded and
//! pull-based; legacy outlets are unbounded and only stop filling while their
//! producer is paused through `FlowControl`.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::errors::{TryWriteError, WriteError};
use crate::units::Chunk;

/// What travels over unit channels: data, then an explicit end marker.
///
/// A channel that closes without `End` means the producer was torn down.
#[derive(Debug)]
pub(crate) enum Frame {
    Chunk(Chunk),
    End(Option<EndAck>),
}

impl Frame {
    pub fn end() -> Self {
        Frame::End(None)
    }

    /// An end marker that reports back once the outlet's owner pulls it
    pub fn acknowledged_end() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Frame::End(Some(EndAck(tx))), rx)
    }
}

/// Dropped unfired when the end marker is discarded unread
#[derive(Debug)]
pub(crate) struct EndAck(oneshot::Sender<()>);

/// Write side of a unit. Clones share the same input.
#[derive(Clone)]
pub struct Writer {
    unit: Arc<str>,
    tx: mpsc::Sender<Frame>,
}

/// A reserved input slot, obtained once the unit is ready for more input
pub struct WritePermit<'a> {
    permit: mpsc::Permit<'a, Frame>,
}

impl WritePermit<'_> {
    pub fn write(self, chunk: Chunk) {
        self.permit.send(Frame::Chunk(chunk));
    }
}

impl Writer {
    pub(crate) fn new(unit: Arc<str>, tx: mpsc::Sender<Frame>) -> Self {
        Self { unit, tx }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit
    }

    /// Write a chunk, waiting while the unit's input is saturated
    pub async fn write(&self, chunk: impl Into<Chunk>) -> Result<(), WriteError> {
        self.tx
            .send(Frame::Chunk(chunk.into()))
            .await
            .map_err(|_| self.closed())
    }

    /// Write without waiting; a saturated input hands the chunk back
    pub fn try_write(&self, chunk: Chunk) -> Result<(), TryWriteError> {
        match self.tx.try_reserve() {
            Ok(permit) => {
                permit.send(Frame::Chunk(chunk));
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(())) => Err(TryWriteError::Saturated(chunk)),
            Err(mpsc::error::TrySendError::Closed(())) => Err(TryWriteError::Closed(chunk)),
        }
    }

    /// Resolve once the unit can accept another chunk
    pub async fn ready(&self) -> Result<WritePermit<'_>, WriteError> {
        let permit = self.tx.reserve().await.map_err(|_| self.closed())?;
        Ok(WritePermit { permit })
    }

    /// Signal that no more chunks will be written
    pub async fn end(&self) -> Result<(), WriteError> {
        self.tx.send(Frame::end()).await.map_err(|_| self.closed())
    }

    /// Whether the unit currently has room for at least one chunk
    pub fn has_capacity(&self) -> bool {
        self.tx.capacity() > 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn closed(&self) -> WriteError {
        WriteError::Closed {
            unit: self.unit.to_string(),
        }
    }
}

/// Pause switch between a legacy producer and whoever drains it
#[derive(Clone)]
pub(crate) struct FlowControl {
    paused: Arc<watch::Sender<bool>>,
}

impl FlowControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            paused: Arc::new(paused),
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Wait until the consumer allows production again
    pub async fn wait_resumed(&self) {
        let mut rx = self.paused.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

pub(crate) struct LegacyOutlet {
    pub rx: mpsc::UnboundedReceiver<Frame>,
    pub flow: FlowControl,
}

/// Result of pulling from an outlet
#[derive(Debug)]
pub(crate) enum Pulled {
    Chunk(Chunk),
    End,
    /// The producer went away without ending its output
    Aborted,
}

/// Output side of a unit, owned by a single consumer
pub(crate) enum Outlet {
    Standard(mpsc::Receiver<Frame>),
    Legacy(LegacyOutlet),
}

impl Outlet {
    pub async fn pull(&mut self) -> Pulled {
        let frame = match self {
            Outlet::Standard(rx) => rx.recv().await,
            Outlet::Legacy(legacy) => legacy.rx.recv().await,
        };
        match frame {
            Some(Frame::Chunk(chunk)) => Pulled::Chunk(chunk),
            Some(Frame::End(ack)) => {
                if let Some(EndAck(ack)) = ack {
                    // The producer may already be gone; nothing to report to
                    let _ = ack.send(());
                }
                Pulled::End
            }
            None => Pulled::Aborted,
        }
    }

    /// Ask the producer to stop; only push-mode producers need telling
    pub fn pause(&self) {
        if let Outlet::Legacy(legacy) = self {
            legacy.flow.pause();
        }
    }

    pub fn resume(&self) {
        if let Outlet::Legacy(legacy) = self {
            legacy.flow.resume();
        }
    }
}

/// Read side of a unit, handed to the caller by `Unit::take_reader`.
pub struct Reader {
    unit: Arc<str>,
    outlet: Outlet,
    done: bool,
}

impl Reader {
    pub(crate) fn new(unit: Arc<str>, outlet: Outlet) -> Self {
        Self {
            unit,
            outlet,
            done: false,
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit
    }

    /// Next chunk, or `None` once the output ended or was torn down
    pub async fn read(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }
        match self.outlet.pull().await {
            Pulled::Chunk(chunk) => Some(chunk),
            Pulled::End | Pulled::Aborted => {
                self.done = true;
                None
            }
        }
    }

    /// Drain everything that remains
    pub async fn collect(mut self) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.read().await {
            chunks.push(chunk);
        }
        chunks
    }
}
