use async_trait::async_trait;

use crate::Result;

/// Inbound port for pushed updates (webhook mode).
///
/// The HTTP layer hands the raw request body to the transport adapter, which
/// decodes it and feeds the router. Undecodable payloads are `Error::Json`.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    async fn accept(&self, payload: &[u8]) -> Result<()>;
}
