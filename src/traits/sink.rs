use async_trait::async_trait;

use crate::errors::UnitError;
use crate::units::Chunk;

/// Consumes chunks for a write-only unit.
#[async_trait]
pub trait Sink: Send {
    async fn consume(&mut self, chunk: Chunk) -> Result<(), UnitError>;

    /// Called once after the last chunk, before the unit reports Finish
    async fn close(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}
