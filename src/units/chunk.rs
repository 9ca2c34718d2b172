// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

/// One item flowing between units.
///
/// Item-mode pipelines carry arbitrary JSON values; byte-mode pipelines carry
/// raw bytes. Text is an item-mode string by default.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Bytes(Vec<u8>),
    Object(Value),
}

impl Chunk {
    pub fn text(text: impl Into<String>) -> Self {
        Chunk::Object(Value::String(text.into()))
    }

    /// Borrow the chunk as text when it is an item-mode string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Chunk::Object(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Decode the chunk as text, accepting UTF-8 bytes as well
    pub fn to_text(&self) -> Option<String> {
        match self {
            Chunk::Object(Value::String(text)) => Some(text.clone()),
            Chunk::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
            Chunk::Object(_) => None,
        }
    }

    /// Build a chunk of the same variant holding new text
    pub fn with_text(&self, text: String) -> Self {
        match self {
            Chunk::Bytes(_) => Chunk::Bytes(text.into_bytes()),
            Chunk::Object(_) => Chunk::text(text),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Chunk::Object(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Chunk::Bytes(_) => "bytes",
            Chunk::Object(_) => "object",
        }
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::text(text)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::text(text)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl From<Value> for Chunk {
    fn from(value: Value) -> Self {
        Chunk::Object(value)
    }
}
