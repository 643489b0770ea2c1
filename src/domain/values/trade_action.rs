use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leg action of a trade.
///
/// The wire spelling is kept as sent: the backend writes stop-loss exits as
/// `stop_loss`, and any action it adds later is shown as a stop without
/// failing the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeAction {
    Open,
    Close,
    Stop,
    StopLoss,
    Other(String),
}

impl TradeAction {
    pub fn as_str(&self) -> &str {
        match self {
            TradeAction::Open => "open",
            TradeAction::Close => "close",
            TradeAction::Stop => "stop",
            TradeAction::StopLoss => "stop_loss",
            TradeAction::Other(raw) => raw,
        }
    }

    /// Anything other than an open or a close exits as a stop.
    pub fn is_stop(&self) -> bool {
        !matches!(self, TradeAction::Open | TradeAction::Close)
    }

    /// Column label: `open`, `close` or `stop`.
    pub fn label(&self) -> &str {
        if self.is_stop() {
            "stop"
        } else {
            self.as_str()
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TradeAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "open" => TradeAction::Open,
            "close" => TradeAction::Close,
            "stop" => TradeAction::Stop,
            "stop_loss" => TradeAction::StopLoss,
            _ => TradeAction::Other(raw),
        }
    }
}

impl From<TradeAction> for String {
    fn from(action: TradeAction) -> Self {
        match action {
            TradeAction::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "open"),
            TradeStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            _ => Err(format!("Unknown trade status: {s}")),
        }
    }
}
