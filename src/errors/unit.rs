// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by pipeline members.
//!
//! A `UnitError` is relayed verbatim from the unit that raised it to every
//! listener of the composite, so it is a cheap handle over a shared value.
//! Equality is identity: a relayed error compares equal to the error it was
//! relayed from and to nothing else.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// What went wrong inside a unit.
#[derive(Debug, Error)]
pub enum UnitErrorKind {
    /// Free-form failure reported by a unit implementation
    #[error("{0}")]
    Failed(String),

    /// A byte-mode unit received an item-mode chunk
    #[error("unit '{unit}' cannot accept a {found} chunk in byte mode")]
    InvalidChunk { unit: String, found: &'static str },

    /// The tail closed without finishing (only under `ClosePolicy::RequireFinish`)
    #[error("unit '{unit}' closed before it finished")]
    PrematureClose { unit: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared, cloneable error value carried on unit error channels.
#[derive(Clone)]
pub struct UnitError(Arc<UnitErrorKind>);

impl UnitError {
    /// Create a free-form failure with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self::from(UnitErrorKind::Failed(message.into()))
    }

    pub fn invalid_chunk(unit: &str, found: &'static str) -> Self {
        Self::from(UnitErrorKind::InvalidChunk {
            unit: unit.to_string(),
            found,
        })
    }

    pub fn premature_close(unit: &str) -> Self {
        Self::from(UnitErrorKind::PrematureClose {
            unit: unit.to_string(),
        })
    }

    pub fn kind(&self) -> &UnitErrorKind {
        &self.0
    }

    /// True when both handles point at the same error occurrence
    pub fn same_as(&self, other: &UnitError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<UnitErrorKind> for UnitError {
    fn from(kind: UnitErrorKind) -> Self {
        Self(Arc::new(kind))
    }
}

impl From<std::io::Error> for UnitError {
    fn from(error: std::io::Error) -> Self {
        Self::from(UnitErrorKind::Io(error))
    }
}

impl PartialEq for UnitError {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for UnitError {}

impl fmt::Debug for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for UnitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.0)
    }
}
