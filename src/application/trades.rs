use crate::domain::entities::position::Position;
use crate::domain::entities::trade_record::{sort_newest_first, TradeRecord};
use crate::domain::error::MonitorError;
use crate::domain::ports::execution_backend::{ExecutionBackend, TradeQuery};
use std::sync::Arc;

/// Historical trade and position queries outside the monitor loop.
pub struct TradeHistoryUseCase {
    backend: Arc<dyn ExecutionBackend>,
}

impl TradeHistoryUseCase {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self { backend }
    }

    /// Trades matching `query`, newest first. `limit` keeps the most recent ones.
    pub async fn list(&self, query: &TradeQuery, limit: Option<usize>) -> Result<Vec<TradeRecord>, MonitorError> {
        let mut trades = self.backend.trades(query).await?;
        sort_newest_first(&mut trades);
        if let Some(limit) = limit {
            trades.truncate(limit);
        }
        Ok(trades)
    }

    pub async fn closed(&self) -> Result<Vec<TradeRecord>, MonitorError> {
        self.list(&TradeQuery::closed(), None).await
    }

    pub async fn positions(&self) -> Result<Vec<Position>, MonitorError> {
        self.backend.positions().await
    }
}
