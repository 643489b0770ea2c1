use serde::{Deserialize, Serialize};
use std::fmt;

/// The monitor's belief about the backend execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    /// No successful reconciliation has happened yet and the last attempt failed.
    Unknown,
    /// Status read in flight.
    Reconciling,
    Idle,
    Running,
    /// Stop command in flight.
    Stopping,
}

impl MonitorState {
    /// Whether the state is one of the settled beliefs a reconciliation can
    /// fall back to.
    pub fn is_settled(&self) -> bool {
        matches!(self, MonitorState::Unknown | MonitorState::Idle | MonitorState::Running)
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorState::Unknown => write!(f, "unknown"),
            MonitorState::Reconciling => write!(f, "reconciling"),
            MonitorState::Idle => write!(f, "idle"),
            MonitorState::Running => write!(f, "running"),
            MonitorState::Stopping => write!(f, "stopping"),
        }
    }
}
