use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::error::MonitorError;
use crate::domain::values::trade_action::TradeStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

/// Reply to a start or stop command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub status: CommandStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl CommandReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: message.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: message.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// Application failures become [`MonitorError::Application`] carrying the backend message.
    pub fn into_result(self) -> Result<CommandReply, MonitorError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(MonitorError::Application(self.message))
        }
    }
}

/// Filter for the trades endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeQuery {
    pub status: Option<TradeStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TradeQuery {
    pub fn closed() -> Self {
        Self {
            status: Some(TradeStatus::Closed),
            ..Default::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(start) = &self.start_date {
            params.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            params.push(("end_date", end.clone()));
        }
        params
    }
}

/// Request/response side of the execution backend.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Reconciliation read.
    async fn status(&self) -> Result<RunStatus, MonitorError>;

    /// Transport failures are `Err`; application failures come back as a
    /// reply with `status: error`.
    async fn start(&self) -> Result<CommandReply, MonitorError>;

    async fn stop(&self) -> Result<CommandReply, MonitorError>;

    async fn trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, MonitorError>;

    async fn positions(&self) -> Result<Vec<Position>, MonitorError>;
}
