//! Shared test helpers: in-memory backend, controllable push stream and chart probe.
#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use pairwatch::application::runtime::{MonitorHandle, MonitorPorts};
use pairwatch::domain::entities::position::Position;
use pairwatch::domain::entities::run_status::RunStatus;
use pairwatch::domain::entities::trade_record::TradeRecord;
use pairwatch::domain::error::MonitorError;
use pairwatch::domain::ports::chart_probe::ChartProbe;
use pairwatch::domain::ports::execution_backend::{CommandReply, ExecutionBackend, TradeQuery};
use pairwatch::domain::ports::progress_stream::{EventStream, ProgressStream};
use pairwatch::domain::values::cache_buster::CacheBuster;
use pairwatch::domain::values::monitor_config::MonitorConfig;
use pairwatch::domain::values::trade_action::{TradeAction, TradeStatus};
use pairwatch::infrastructure::render::recording::RecordingRenderer;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn running_status(progress: f64, date: &str) -> RunStatus {
    RunStatus {
        running: true,
        progress: Some(progress),
        current_label: Some(date.to_string()),
        ..RunStatus::default()
    }
}

pub fn trade(ts: &str, pair: &str, action: TradeAction, status: TradeStatus, pnl: Option<f64>) -> TradeRecord {
    TradeRecord {
        timestamp: ts.to_string(),
        pair_id: pair.to_string(),
        action,
        long_code: "600036".into(),
        short_code: "601166".into(),
        quantity: 1000.0,
        pnl,
        status,
        extra: Default::default(),
    }
}

pub fn position(pair: &str) -> Position {
    Position {
        pair_id: pair.to_string(),
        kind: Some("long_short".into()),
        stock1_code: "600036".into(),
        stock2_code: "601166".into(),
        stock1_price: Some(35.2),
        stock2_price: Some(17.9),
        quantity: 500.0,
        open_time: Some("20240110".into()),
    }
}

pub struct FakeBackend {
    pub status: Mutex<Result<RunStatus, MonitorError>>,
    pub hang_status: AtomicBool,
    pub start_reply: Mutex<Result<CommandReply, MonitorError>>,
    pub stop_reply: Mutex<Result<CommandReply, MonitorError>>,
    pub trades: Mutex<Vec<TradeRecord>>,
    pub positions: Mutex<Vec<Position>>,
    pub status_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub trade_queries: Mutex<Vec<TradeQuery>>,
}

impl FakeBackend {
    pub fn new(status: RunStatus) -> Self {
        Self {
            status: Mutex::new(Ok(status)),
            hang_status: AtomicBool::new(false),
            start_reply: Mutex::new(Ok(CommandReply::success("started"))),
            stop_reply: Mutex::new(Ok(CommandReply::success("stopped"))),
            trades: Mutex::new(Vec::new()),
            positions: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            trade_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, status: Result<RunStatus, MonitorError>) {
        *self.status.lock().unwrap() = status;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for FakeBackend {
    async fn status(&self) -> Result<RunStatus, MonitorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_status.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.status.lock().unwrap().clone()
    }

    async fn start(&self) -> Result<CommandReply, MonitorError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start_reply.lock().unwrap().clone()
    }

    async fn stop(&self) -> Result<CommandReply, MonitorError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stop_reply.lock().unwrap().clone()
    }

    async fn trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, MonitorError> {
        self.trade_queries.lock().unwrap().push(query.clone());
        let trades = self.trades.lock().unwrap().clone();
        Ok(trades
            .into_iter()
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .collect())
    }

    async fn positions(&self) -> Result<Vec<Position>, MonitorError> {
        Ok(self.positions.lock().unwrap().clone())
    }
}

/// Push stream whose connections are driven by the test.
#[derive(Default)]
pub struct FakeStream {
    opens: AtomicUsize,
    fail_open: AtomicBool,
    senders: Mutex<Vec<UnboundedSender<Result<String, MonitorError>>>>,
}

impl FakeStream {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Deliver a raw payload on the most recent connection.
    pub fn push(&self, raw: &str) {
        if let Some(tx) = self.senders.lock().unwrap().last() {
            let _ = tx.unbounded_send(Ok(raw.to_string()));
        }
    }

    /// Transport error on the most recent connection.
    pub fn break_connection(&self) {
        if let Some(tx) = self.senders.lock().unwrap().last() {
            let _ = tx.unbounded_send(Err(MonitorError::Transport("connection reset".into())));
        }
    }

    /// Connections whose receiving side is still alive.
    pub fn live_connections(&self) -> usize {
        self.senders.lock().unwrap().iter().filter(|tx| !tx.is_closed()).count()
    }
}

#[async_trait]
impl ProgressStream for FakeStream {
    async fn open(&self) -> Result<EventStream, MonitorError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(MonitorError::Transport("connection refused".into()));
        }
        let (tx, rx) = unbounded();
        self.senders.lock().unwrap().push(tx);
        Ok(rx.boxed())
    }
}

/// Chart probe answering from a script of results; resolves once the script runs out.
#[derive(Default)]
pub struct FakeCharts {
    pub results: Mutex<VecDeque<bool>>,
    pub probed: Mutex<Vec<String>>,
}

impl FakeCharts {
    pub fn scripted(results: &[bool]) -> Self {
        Self {
            results: Mutex::new(results.iter().copied().collect()),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartProbe for FakeCharts {
    async fn resolve(&self, url: &str) -> Result<(), MonitorError> {
        self.probed.lock().unwrap().push(url.to_string());
        match self.results.lock().unwrap().pop_front() {
            Some(false) => Err(MonitorError::Transport(format!("{url} returned 404"))),
            _ => Ok(()),
        }
    }
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        reconnect_delay: Duration::from_secs(5),
        chart_retry_delay: Duration::from_secs(5),
        poll_interval: Duration::from_secs(3600),
        request_timeout: Duration::from_secs(30),
        initial_chart: None,
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub stream: Arc<FakeStream>,
    pub charts: Arc<FakeCharts>,
    pub renderer: Arc<RecordingRenderer>,
    pub monitor: MonitorHandle,
}

pub fn spawn(backend: FakeBackend, charts: FakeCharts, config: MonitorConfig) -> Harness {
    let backend = Arc::new(backend);
    let stream = Arc::new(FakeStream::default());
    let charts = Arc::new(charts);
    let renderer = Arc::new(RecordingRenderer::new());
    let monitor = MonitorHandle::spawn_with_buster(
        config,
        MonitorPorts {
            backend: backend.clone(),
            stream: stream.clone(),
            charts: charts.clone(),
            renderer: renderer.clone(),
        },
        CacheBuster::starting_at(0),
    );
    Harness {
        backend,
        stream,
        charts,
        renderer,
        monitor,
    }
}

/// Let every ready task run before the test continues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
