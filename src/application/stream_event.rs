//! Parsing of server-push progress events.

use crate::domain::entities::trade_record::{lenient_opt_f64, TradeRecord};
use crate::domain::error::MonitorError;
use crate::domain::values::metrics::Metrics;
use serde::Deserialize;

/// One partial update. Every field is optional and independent of the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressEvent {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub trades: Option<Vec<TradeRecord>>,
    #[serde(default)]
    pub chart_url: Option<String>,
}

impl ProgressEvent {
    /// Parse a raw event payload. `null`, empty strings and empty trade
    /// lists count as absent.
    pub fn parse(raw: &str) -> Result<Self, MonitorError> {
        let mut event: ProgressEvent = serde_json::from_str(raw)?;
        if event.date.as_deref().is_some_and(|d| d.is_empty()) {
            event.date = None;
        }
        if event.chart_url.as_deref().is_some_and(|c| c.is_empty()) {
            event.chart_url = None;
        }
        if event.trades.as_ref().is_some_and(|t| t.is_empty()) {
            event.trades = None;
        }
        Ok(event)
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.date.is_none()
            && self.metrics.is_none()
            && self.trades.is_none()
            && self.chart_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_event() {
        let ev = ProgressEvent::parse(
            r#"{"progress":12.5,"date":"20240103","metrics":{"win_rate":"50.00%"},
                "trades":[],"chart_url":"static/execution_results.png?t=99"}"#,
        )
        .unwrap();
        assert_eq!(ev.progress, Some(12.5));
        assert_eq!(ev.date.as_deref(), Some("20240103"));
        assert!(ev.metrics.is_some());
        assert!(ev.trades.is_none());
        assert_eq!(ev.chart_url.as_deref(), Some("static/execution_results.png?t=99"));
    }

    #[test]
    fn test_nulls_and_missing_fields_are_absent() {
        let ev = ProgressEvent::parse(r#"{"progress":0,"date":null,"metrics":null,"chart_url":""}"#).unwrap();
        assert_eq!(ev.progress, Some(0.0));
        assert!(ev.date.is_none() && ev.metrics.is_none() && ev.chart_url.is_none());
        assert!(ProgressEvent::parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_payloads_are_malformed() {
        for raw in ["not json", "[1,2]", r#"{"progress":"half"}"#, r#"{"trades":[{"pair_id":1}]}"#] {
            let err = ProgressEvent::parse(raw).unwrap_err();
            assert!(matches!(err, MonitorError::Malformed(_)), "{raw}");
        }
    }
}
