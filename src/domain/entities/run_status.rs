use crate::domain::values::metrics::Metrics;
use crate::domain::values::progress::ProgressView;
use serde::{Deserialize, Serialize};

/// Snapshot of the backend execution loop as returned by a status read.
///
/// A newer read replaces the previous one wholesale; nothing is merged across reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub running: bool,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, rename = "current_date")]
    pub current_label: Option<String>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
    #[serde(default, rename = "chart_url")]
    pub chart_ref: Option<String>,
}

impl RunStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn progress_view(&self) -> Option<ProgressView> {
        self.progress
            .map(|p| ProgressView::new(p, self.current_label.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_backend_field_names() {
        let s: RunStatus = serde_json::from_str(
            r#"{"running":true,"progress":40,"current_date":"20240115","chart_url":"static/c.png?t=1"}"#,
        )
        .unwrap();
        assert!(s.running);
        assert_eq!(s.current_label.as_deref(), Some("20240115"));
        assert_eq!(s.chart_ref.as_deref(), Some("static/c.png?t=1"));
        assert!(s.metrics.is_none());
    }

    #[test]
    fn test_nulls_are_absent() {
        let s: RunStatus =
            serde_json::from_str(r#"{"running":false,"progress":null,"metrics":null}"#).unwrap();
        assert_eq!(s, RunStatus::idle());
        assert!(s.progress_view().is_none());
    }
}
