mod common;

use common::{position, trade, FakeBackend};
use pairwatch::application::trades::TradeHistoryUseCase;
use pairwatch::domain::entities::position::Position;
use pairwatch::domain::entities::run_status::RunStatus;
use pairwatch::domain::entities::trade_record::TradeRecord;
use pairwatch::domain::ports::execution_backend::TradeQuery;
use pairwatch::domain::values::trade_action::{TradeAction, TradeStatus};
use std::sync::Arc;

fn setup(trades: Vec<TradeRecord>) -> (Arc<FakeBackend>, TradeHistoryUseCase) {
    let backend = Arc::new(FakeBackend::new(RunStatus::idle()));
    *backend.trades.lock().unwrap() = trades;
    let uc = TradeHistoryUseCase::new(backend.clone());
    (backend, uc)
}

#[test]
fn test_trade_record_keeps_unknown_fields() {
    let raw = r#"{
        "timestamp": "20240115 14:55:00",
        "pair_id": "600036_601166",
        "action": "close",
        "long_code": "600036",
        "short_code": "601166",
        "quantity": "1200",
        "pnl": 356.4,
        "status": "closed",
        "hedge_ratio": 0.87,
        "exit_reason": "mean reverted"
    }"#;
    let record: TradeRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(record.action, TradeAction::Close);
    assert_eq!(record.quantity, 1200.0);
    assert_eq!(record.realized_pnl(), Some(356.4));
    assert_eq!(record.display_date(), "2024-01-15");
    assert_eq!(record.extra["exit_reason"], "mean reverted");

    let back = serde_json::to_value(&record).unwrap();
    assert_eq!(back["hedge_ratio"], 0.87);
    assert_eq!(back["status"], "closed");
}

#[test]
fn test_stop_loss_row_round_trips_unchanged() {
    let raw = serde_json::json!({
        "timestamp": "20240301 10:15:00",
        "pair_id": "600036_601166",
        "action": "stop_loss",
        "long_code": "600036",
        "short_code": "601166",
        "quantity": 800.0,
        "pnl": -412.0,
        "status": "closed",
        "z_score": 3.1
    });
    let record: TradeRecord = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(record.action, TradeAction::StopLoss);
    assert_eq!(record.action.label(), "stop");
    assert_eq!(serde_json::to_value(&record).unwrap(), raw);
}

#[tokio::test]
async fn test_closed_history_with_stop_loss_loads() {
    let mut stopped = trade("20240301", "s", TradeAction::StopLoss, TradeStatus::Closed, Some(-412.0));
    stopped.extra.insert("z_score".into(), serde_json::json!(3.1));
    let (_, uc) = setup(vec![
        trade("20240210", "c", TradeAction::Close, TradeStatus::Closed, Some(20.0)),
        stopped,
    ]);
    let trades = uc.closed().await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].action, TradeAction::StopLoss);
}

#[test]
fn test_open_leg_has_no_realized_pnl() {
    let record = trade("20240110", "p", TradeAction::Open, TradeStatus::Open, Some(12.0));
    assert_eq!(record.realized_pnl(), None);
}

#[test]
fn test_position_accepts_type_field_and_string_prices() {
    let raw = r#"{"pair_id": "p1", "type": "long_short", "stock1_code": "600036",
        "stock2_code": "601166", "stock1_price": "35.20", "stock2_price": 17.9, "quantity": 500}"#;
    let pos: Position = serde_json::from_str(raw).unwrap();
    assert_eq!(pos.kind.as_deref(), Some("long_short"));
    assert_eq!(pos.stock1_price, Some(35.2));
    assert_eq!(pos.quantity, 500.0);
    assert!(pos.open_time.is_none());
}

#[tokio::test]
async fn test_list_sorts_newest_first_and_limits() {
    let (_, uc) = setup(vec![
        trade("20240103", "a", TradeAction::Open, TradeStatus::Open, None),
        trade("20240310", "b", TradeAction::Close, TradeStatus::Closed, Some(5.0)),
        trade("20240201", "c", TradeAction::Stop, TradeStatus::Closed, Some(-2.0)),
    ]);

    let trades = uc.list(&TradeQuery::default(), Some(2)).await.unwrap();
    let pairs: Vec<&str> = trades.iter().map(|t| t.pair_id.as_str()).collect();
    assert_eq!(pairs, vec!["b", "c"]);
}

#[tokio::test]
async fn test_closed_queries_closed_status() {
    let (backend, uc) = setup(vec![
        trade("20240103", "a", TradeAction::Open, TradeStatus::Open, None),
        trade("20240310", "b", TradeAction::Close, TradeStatus::Closed, Some(5.0)),
    ]);

    let trades = uc.closed().await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].status, TradeStatus::Closed);
    assert_eq!(backend.trade_queries.lock().unwrap().clone(), vec![TradeQuery::closed()]);
}

#[tokio::test]
async fn test_positions_pass_through() {
    let (backend, uc) = setup(vec![]);
    *backend.positions.lock().unwrap() = vec![position("p1"), position("p2")];
    let positions = uc.positions().await.unwrap();
    assert_eq!(positions.len(), 2);
}

#[test]
fn test_trade_query_params() {
    let query = TradeQuery {
        status: Some(TradeStatus::Closed),
        start_date: Some("20240101".into()),
        end_date: None,
    };
    let params = query.params();
    assert!(params.contains(&("status", "closed".to_string())));
    assert!(params.contains(&("start_date", "20240101".to_string())));
    assert_eq!(params.len(), 2);
}
