use async_trait::async_trait;

use crate::errors::UnitError;
use crate::units::Chunk;

/// Produces chunks for a read-capable unit.
///
/// Returning `None` ends the unit's output; returning an error fails the unit.
#[async_trait]
pub trait Source: Send {
    async fn produce(&mut self) -> Option<Result<Chunk, UnitError>>;

    fn name(&self) -> &'static str;
}
