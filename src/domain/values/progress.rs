use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display projection of run progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    /// 0..=100
    pub percent: f64,
    /// Opaque period marker as sent by the backend (typically `YYYYMMDD`).
    pub label: Option<String>,
}

impl ProgressView {
    pub fn new(percent: f64, label: Option<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            label,
        }
    }

    /// Rounded percentage, e.g. `40%`.
    pub fn percent_text(&self) -> String {
        format!("{}%", self.percent.round() as i64)
    }

    /// Label formatted for display: `20240115` becomes `2024-01-15`.
    pub fn date_label(&self) -> Option<String> {
        self.label.as_deref().map(format_period_label)
    }
}

/// Render a `YYYYMMDD` calendar date as `YYYY-MM-DD`; other markers pass through.
pub fn format_period_label(raw: &str) -> String {
    if raw.len() != 8 {
        return raw.to_string();
    }
    match NaiveDate::parse_from_str(raw, "%Y%m%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}
