use crate::domain::error::MonitorError;
use async_trait::async_trait;

/// Checks whether a chart URL currently resolves to a rendered image.
#[async_trait]
pub trait ChartProbe: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<(), MonitorError>;
}
