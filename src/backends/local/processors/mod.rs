// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod collector;
pub mod iter_source;
pub mod prefix_suffix_adder;
pub mod reverse_text;

pub use change_text_case::*;
pub use collector::*;
pub use iter_source::*;
pub use prefix_suffix_adder::*;
pub use reverse_text::*;

use crate::errors::UnitError;
use crate::units::Chunk;

/// Text content of a chunk, or an invalid-data error naming the unit
pub(crate) fn chunk_text(unit: &str, chunk: &Chunk) -> Result<String, UnitError> {
    chunk.to_text().ok_or_else(|| {
        UnitError::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} expects UTF-8 text, got a non-text {} chunk", unit, chunk.kind_name()),
        ))
    })
}
