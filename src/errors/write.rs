// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::units::Chunk;
use thiserror::Error;

/// A write could not be delivered because the unit stopped accepting input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    #[error("unit '{unit}' no longer accepts input")]
    Closed { unit: String },
}

/// Outcome of a non-waiting write; the rejected chunk is handed back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TryWriteError {
    /// The unit's input buffer is full; wait on `Writer::ready` before retrying
    #[error("unit input is saturated")]
    Saturated(Chunk),

    #[error("unit no longer accepts input")]
    Closed(Chunk),
}

impl TryWriteError {
    pub fn into_chunk(self) -> Chunk {
        match self {
            TryWriteError::Saturated(chunk) | TryWriteError::Closed(chunk) => chunk,
        }
    }
}
