use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    /// Network or connection failure on any call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request stalled past the configured bound. Handled as a transport failure.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Well-formed response whose status field reports failure.
    /// Displays the backend's message verbatim.
    #[error("{0}")]
    Application(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Monitor has been disposed")]
    Disposed,
}

impl MonitorError {
    /// Transport-class failures, including timeouts. Their detail is not shown
    /// to the user.
    pub fn is_transport(&self) -> bool {
        matches!(self, MonitorError::Transport(_) | MonitorError::Timeout(_))
    }

    /// Message shown to the user when a command fails.
    pub fn user_message(&self) -> String {
        if self.is_transport() {
            return "Request failed, check the backend connection".to_string();
        }
        match self {
            MonitorError::Application(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        MonitorError::Malformed(e.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MonitorError::Timeout(e.to_string())
        } else if e.is_decode() {
            MonitorError::Malformed(e.to_string())
        } else {
            MonitorError::Transport(e.to_string())
        }
    }
}
