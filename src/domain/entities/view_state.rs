use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::values::monitor_state::MonitorState;
use serde::{Deserialize, Serialize};

/// Date range the backend reported when a run was started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SessionWindow {
    pub fn describe(&self) -> String {
        format!(
            "{} to {}",
            self.start_date.as_deref().unwrap_or("unspecified"),
            self.end_date.as_deref().unwrap_or("unspecified")
        )
    }
}

/// Display-ready projection owned by the execution monitor.
///
/// `status.chart_ref` is the reference as received; the stamped URL handed
/// to the renderer is tracked separately since it changes on every hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub state: MonitorState,
    pub status: RunStatus,
    pub trades: Vec<TradeRecord>,
    pub positions: Vec<Position>,
    pub session_window: Option<SessionWindow>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            state: MonitorState::Reconciling,
            status: RunStatus::idle(),
            trades: Vec::new(),
            positions: Vec::new(),
            session_window: None,
        }
    }
}
