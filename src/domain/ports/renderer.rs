use crate::domain::entities::view_state::ViewState;
use crate::domain::values::metrics::Metrics;
use crate::domain::values::monitor_state::MonitorState;
use crate::domain::values::progress::ProgressView;

/// What changed in the view-state since the previous notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    State(MonitorState),
    /// A status read replaced the whole run status.
    Status,
    Progress(ProgressView),
    Metrics(Metrics),
    Trades,
    Positions,
    SessionWindow,
    /// Stamped chart URL to display.
    Chart(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible message, e.g. a failed start.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Display surface. Called from the monitor task, one notification at a time.
pub trait Renderer: Send + Sync {
    fn render(&self, change: &ViewChange, view: &ViewState);
    fn notify(&self, notice: &Notice);
}
