// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Units: the stream-like endpoints a pipeline is built from.
//!
//! # Notification protocol
//!
//! | Notification | Surface                                   |
//! |--------------|-------------------------------------------|
//! | data         | `Reader::read` on the unit's single outlet |
//! | ready/drain  | `Writer::ready`, `Writer::try_write`       |
//! | error        | `UnitEvent::Error` via `Unit::subscribe`   |
//! | finish/close | `UnitEvent::Finish` / `UnitEvent::Close`   |

pub(crate) mod adapter;
mod chunk;
mod event;
pub(crate) mod io;
pub(crate) mod runtime;
mod unit;

pub use chunk::Chunk;
pub use event::{Events, UnitEvent};
pub(crate) use event::{EventHub, Relay};
pub use io::{Reader, WritePermit, Writer};
pub use unit::{Capability, ReadContract, StreamMode, Unit, UnitKind, UnitSettings};
