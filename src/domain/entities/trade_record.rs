use crate::domain::values::progress::format_period_label;
use crate::domain::values::trade_action::{TradeAction, TradeStatus};
use serde::{Deserialize, Deserializer, Serialize};

/// One leg event of a pairs trade as reported by the backend.
///
/// Fields the client does not interpret are kept in `extra` so a record
/// passes through display and re-sorting unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: String,
    pub pair_id: String,
    pub action: TradeAction,
    pub long_code: String,
    pub short_code: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub pnl: Option<f64>,
    pub status: TradeStatus,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TradeRecord {
    /// PnL is meaningful only once the position is closed.
    pub fn realized_pnl(&self) -> Option<f64> {
        if self.action == TradeAction::Close || self.status == TradeStatus::Closed {
            self.pnl
        } else {
            None
        }
    }

    /// Timestamp formatted for display: a leading `YYYYMMDD` becomes `YYYY-MM-DD`.
    pub fn display_date(&self) -> String {
        let ts = self.timestamp.as_str();
        match ts.get(..8) {
            Some(day) if day.bytes().all(|b| b.is_ascii_digit()) => format_period_label(day),
            _ => ts.to_string(),
        }
    }
}

/// Sort newest first by timestamp. Stable, so equal timestamps keep backend order.
pub fn sort_newest_first(trades: &mut [TradeRecord]) {
    trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn parse_number(value: NumberOrText) -> Result<f64, String> {
    match value {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("not a number: {s:?}")),
    }
}

/// Accepts a JSON number or a numeric string.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberOrText::deserialize(deserializer)?;
    parse_number(value).map_err(serde::de::Error::custom)
}

/// Like [`lenient_f64`] but `null` (and an empty string) mean absent.
pub(crate) fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => parse_number(value).map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str) -> TradeRecord {
        TradeRecord {
            timestamp: ts.into(),
            pair_id: "600000_601988".into(),
            action: TradeAction::Open,
            long_code: "600000".into(),
            short_code: "601988".into(),
            quantity: 100.0,
            pnl: None,
            status: TradeStatus::Open,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let t: TradeRecord = serde_json::from_str(
            r#"{"timestamp":"20240115","pair_id":"p","action":"close","long_code":"a",
                "short_code":"b","quantity":"12.5","pnl":"-3.25","status":"closed"}"#,
        )
        .unwrap();
        assert_eq!(t.quantity, 12.5);
        assert_eq!(t.pnl, Some(-3.25));
        assert_eq!(t.realized_pnl(), Some(-3.25));
    }

    #[test]
    fn test_open_leg_hides_pnl() {
        let mut t = record("20240115");
        t.pnl = Some(0.0);
        assert_eq!(t.realized_pnl(), None);
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut a = record("20240101");
        a.pair_id = "first".into();
        let mut b = record("20240101");
        b.pair_id = "second".into();
        let c = record("20240301");
        let mut trades = vec![a, b, c];
        sort_newest_first(&mut trades);
        assert_eq!(trades[0].timestamp, "20240301");
        assert_eq!(trades[1].pair_id, "first");
        assert_eq!(trades[2].pair_id, "second");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(record("20240115093000").display_date(), "2024-01-15");
        assert_eq!(record("2024-01-15").display_date(), "2024-01-15");
    }

    #[test]
    fn test_bad_quantity_is_rejected() {
        let res: Result<TradeRecord, _> = serde_json::from_str(
            r#"{"timestamp":"1","pair_id":"p","action":"open","long_code":"a",
                "short_code":"b","quantity":"lots","pnl":null,"status":"open"}"#,
        );
        assert!(res.is_err());
    }
}
