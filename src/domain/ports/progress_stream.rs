use crate::domain::error::MonitorError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Raw event payloads, one item per server-push event.
///
/// An `Err` item or the end of the stream is a transport-level failure.
pub type EventStream = BoxStream<'static, Result<String, MonitorError>>;

/// Server-push channel delivering incremental progress updates.
#[async_trait]
pub trait ProgressStream: Send + Sync {
    async fn open(&self) -> Result<EventStream, MonitorError>;
}
