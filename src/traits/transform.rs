use async_trait::async_trait;

use crate::errors::UnitError;
use crate::units::Chunk;

/// Maps each incoming chunk for a duplex unit.
#[async_trait]
pub trait Transform: Send {
    /// Transform one chunk; `Ok(None)` drops it
    async fn transform(&mut self, chunk: Chunk) -> Result<Option<Chunk>, UnitError>;

    /// Emit any trailing chunks once the input has ended
    async fn flush(&mut self) -> Result<Vec<Chunk>, UnitError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str;
}
