//! Performance indicators reported by the backend.
//!
//! Values arrive either as numbers or as strings the backend already
//! formatted (e.g. `"12.50%"`). They are displayed as received and never
//! recomputed here.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_return: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_return: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_drawdown: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss_ratio: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_trades: Option<MetricValue>,
}

impl Metrics {
    /// Label/value pairs in dashboard order. Missing indicators show `-`.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let show = |v: &Option<MetricValue>| v.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".into());
        vec![
            ("Total return", show(&self.total_return)),
            ("Annual return", show(&self.annual_return)),
            ("Sharpe ratio", show(&self.sharpe_ratio)),
            ("Max drawdown", show(&self.max_drawdown)),
            ("Win rate", show(&self.win_rate)),
            ("Profit/loss ratio", show(&self.profit_loss_ratio)),
            ("Total trades", show(&self.total_trades)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_value_kinds_parse() {
        let m: Metrics = serde_json::from_str(
            r#"{"total_return":"12.50%","sharpe_ratio":"1.80","total_trades":42}"#,
        )
        .unwrap();
        assert_eq!(m.total_return, Some(MetricValue::Text("12.50%".into())));
        assert_eq!(m.total_trades, Some(MetricValue::Number(42.0)));
        assert!(m.win_rate.is_none());
    }

    #[test]
    fn test_rows_keep_preformatted_text() {
        let m = Metrics {
            win_rate: Some(MetricValue::Text("55.00%".into())),
            total_trades: Some(MetricValue::Number(7.0)),
            ..Default::default()
        };
        let rows = m.rows();
        assert_eq!(rows.len(), 7);
        assert!(rows.contains(&("Win rate", "55.00%".to_string())));
        assert!(rows.contains(&("Total trades", "7".to_string())));
        assert!(rows.contains(&("Max drawdown", "-".to_string())));
    }
}
