// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod unit;
mod write;

pub use config::ConfigError;
pub use unit::{UnitError, UnitErrorKind};
pub use write::{TryWriteError, WriteError};
