//! Tokio driver for [`ExecutionMonitor`].
//!
//! One task owns the monitor. Commands, request completions, stream events
//! and timers all arrive on a single channel and are applied one at a time,
//! so no two completions ever interleave on the view-state. Effects are
//! carried out by spawning short-lived tasks that report back on the same
//! channel.

use crate::application::effect::Effect;
use crate::application::monitor::ExecutionMonitor;
use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::entities::view_state::ViewState;
use crate::domain::error::MonitorError;
use crate::domain::ports::chart_probe::ChartProbe;
use crate::domain::ports::execution_backend::{CommandReply, ExecutionBackend};
use crate::domain::ports::progress_stream::ProgressStream;
use crate::domain::ports::renderer::Renderer;
use crate::domain::values::cache_buster::CacheBuster;
use crate::domain::values::monitor_config::MonitorConfig;
use crate::domain::values::monitor_state::MonitorState;
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

type CommandResult = Result<CommandReply, MonitorError>;

/// Collaborators the monitor drives.
#[derive(Clone)]
pub struct MonitorPorts {
    pub backend: Arc<dyn ExecutionBackend>,
    pub stream: Arc<dyn ProgressStream>,
    pub charts: Arc<dyn ChartProbe>,
    pub renderer: Arc<dyn Renderer>,
}

/// Point-in-time copy of the monitor, published after every applied input.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub id: String,
    pub view: ViewState,
    pub chart_url: Option<String>,
    pub stream_open: bool,
    pub reconnect_pending: bool,
    pub dropped_events: u64,
}

impl MonitorSnapshot {
    pub fn state(&self) -> MonitorState {
        self.view.state
    }
}

enum Input {
    Start(oneshot::Sender<CommandResult>),
    Stop(oneshot::Sender<CommandResult>),
    Recheck,
    Dispose(oneshot::Sender<()>),
    StatusDone { seq: u64, result: Result<RunStatus, MonitorError> },
    StartDone { seq: u64, result: CommandResult },
    StopDone { seq: u64, result: CommandResult },
    TradesDone { seq: u64, result: Result<Vec<TradeRecord>, MonitorError> },
    PositionsDone { seq: u64, result: Result<Vec<Position>, MonitorError> },
    StreamPayload { generation: u64, raw: String },
    StreamFailed { generation: u64, error: MonitorError },
    ReconnectDue { ticket: u64 },
    ChartResolved { ticket: u64, ok: bool },
    ChartRetryDue { ticket: u64 },
}

/// Caller-side reference to a running monitor. Cheap to clone.
#[derive(Clone)]
pub struct MonitorHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<Input>,
    snapshots: watch::Receiver<MonitorSnapshot>,
}

impl MonitorHandle {
    /// Create a monitor and start its task. Must be called inside a tokio runtime.
    pub fn spawn(config: MonitorConfig, ports: MonitorPorts) -> Self {
        let seed = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::spawn_with_buster(config, ports, CacheBuster::starting_at(seed))
    }

    pub fn spawn_with_buster(config: MonitorConfig, ports: MonitorPorts, buster: CacheBuster) -> Self {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = ExecutionMonitor::new(config.clone(), buster);
        let initial = snapshot_of(id, &monitor);
        let (snap_tx, snap_rx) = watch::channel(initial);

        let runtime = MonitorRuntime {
            id,
            monitor,
            config,
            ports,
            tx: tx.clone(),
            snapshots: snap_tx,
            pump: None,
            pending_start: HashMap::new(),
            pending_stop: HashMap::new(),
            dispose_ack: None,
        };
        tokio::spawn(runtime.run(rx).instrument(tracing::info_span!("monitor", id = %id)));

        Self {
            id,
            tx,
            snapshots: snap_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Issue a start command. Application failures come back as
    /// [`MonitorError::Application`] with the backend's message.
    pub async fn start(&self) -> CommandResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Input::Start(reply_tx))?;
        reply_rx.await.map_err(|_| MonitorError::Disposed)?
    }

    pub async fn stop(&self) -> CommandResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Input::Stop(reply_tx))?;
        reply_rx.await.map_err(|_| MonitorError::Disposed)?
    }

    /// Re-enter reconciliation with a fresh status read.
    pub fn recheck(&self) -> Result<(), MonitorError> {
        self.send(Input::Recheck)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Change notifications for a rendering layer that prefers pulling.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until no status read or stop is outstanding.
    pub async fn wait_settled(&self) -> MonitorSnapshot {
        let mut rx = self.snapshots.clone();
        let settled = rx.wait_for(|s| s.state().is_settled()).await;
        match settled {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Close the stream and stop the monitor task.
    pub async fn dispose(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.send(Input::Dispose(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    fn send(&self, input: Input) -> Result<(), MonitorError> {
        self.tx.send(input).map_err(|_| MonitorError::Disposed)
    }
}

fn snapshot_of(id: Uuid, monitor: &ExecutionMonitor) -> MonitorSnapshot {
    MonitorSnapshot {
        id: id.to_string(),
        view: monitor.view().clone(),
        chart_url: monitor.chart_url().map(String::from),
        stream_open: monitor.stream_open(),
        reconnect_pending: monitor.reconnect_pending(),
        dropped_events: monitor.dropped_events(),
    }
}

struct MonitorRuntime {
    id: Uuid,
    monitor: ExecutionMonitor,
    config: MonitorConfig,
    ports: MonitorPorts,
    tx: mpsc::UnboundedSender<Input>,
    snapshots: watch::Sender<MonitorSnapshot>,
    pump: Option<JoinHandle<()>>,
    pending_start: HashMap<u64, oneshot::Sender<CommandResult>>,
    pending_stop: HashMap<u64, oneshot::Sender<CommandResult>>,
    dispose_ack: Option<oneshot::Sender<()>>,
}

impl MonitorRuntime {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Input>) {
        info!("execution monitor started");
        let fx = self.monitor.initialize();
        self.execute(fx);
        self.publish();

        let period = self.config.poll_interval;
        let mut poll = tokio::time::interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let fx = tokio::select! {
                input = rx.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                _ = poll.tick() => self.monitor.poll_tick(),
            };
            self.execute(fx);
            self.publish();
            if self.monitor.is_disposed() {
                break;
            }
        }

        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(ack) = self.dispose_ack.take() {
            let _ = ack.send(());
        }
        info!("execution monitor disposed");
    }

    fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Start(reply) => match self.monitor.request_start() {
                Ok((seq, fx)) => {
                    self.pending_start.insert(seq, reply);
                    fx
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    vec![]
                }
            },
            Input::Stop(reply) => match self.monitor.request_stop() {
                Ok((seq, fx)) => {
                    self.pending_stop.insert(seq, reply);
                    fx
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    vec![]
                }
            },
            Input::Recheck => self.monitor.recheck(),
            Input::Dispose(ack) => {
                self.dispose_ack = Some(ack);
                self.monitor.dispose()
            }
            Input::StatusDone { seq, result } => self.monitor.status_completed(seq, result),
            Input::StartDone { seq, result } => {
                let fx = self.monitor.start_completed(seq, result.clone());
                if let Some(reply) = self.pending_start.remove(&seq) {
                    let _ = reply.send(result.and_then(CommandReply::into_result));
                }
                fx
            }
            Input::StopDone { seq, result } => {
                let fx = self.monitor.stop_completed(seq, result.clone());
                if let Some(reply) = self.pending_stop.remove(&seq) {
                    let _ = reply.send(result.and_then(CommandReply::into_result));
                }
                fx
            }
            Input::TradesDone { seq, result } => self.monitor.trades_completed(seq, result),
            Input::PositionsDone { seq, result } => self.monitor.positions_completed(seq, result),
            Input::StreamPayload { generation, raw } => self.monitor.stream_payload(generation, &raw),
            Input::StreamFailed { generation, error } => self.monitor.stream_failed(generation, &error),
            Input::ReconnectDue { ticket } => self.monitor.reconnect_due(ticket),
            Input::ChartResolved { ticket, ok } => self.monitor.chart_resolved(ticket, ok),
            Input::ChartRetryDue { ticket } => self.monitor.chart_retry_due(ticket),
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchStatus { seq } => {
                    let backend = self.ports.backend.clone();
                    self.spawn_request("status", async move { backend.status().await }, move |result| {
                        Input::StatusDone { seq, result }
                    });
                }
                Effect::SendStart { seq } => {
                    let backend = self.ports.backend.clone();
                    self.spawn_request("start", async move { backend.start().await }, move |result| {
                        Input::StartDone { seq, result }
                    });
                }
                Effect::SendStop { seq } => {
                    let backend = self.ports.backend.clone();
                    self.spawn_request("stop", async move { backend.stop().await }, move |result| {
                        Input::StopDone { seq, result }
                    });
                }
                Effect::LoadTrades { seq, query } => {
                    let backend = self.ports.backend.clone();
                    self.spawn_request("trades", async move { backend.trades(&query).await }, move |result| {
                        Input::TradesDone { seq, result }
                    });
                }
                Effect::LoadPositions { seq } => {
                    let backend = self.ports.backend.clone();
                    self.spawn_request("positions", async move { backend.positions().await }, move |result| {
                        Input::PositionsDone { seq, result }
                    });
                }
                Effect::ResolveChart { ticket, url } => {
                    let charts = self.ports.charts.clone();
                    self.spawn_request("chart", async move { charts.resolve(&url).await }, move |result| {
                        Input::ChartResolved { ticket, ok: result.is_ok() }
                    });
                }
                Effect::OpenStream { generation } => self.open_stream(generation),
                Effect::CloseStream => {
                    if let Some(pump) = self.pump.take() {
                        debug!("closing progress stream");
                        pump.abort();
                    }
                }
                Effect::ScheduleReconnect { ticket, delay } => {
                    debug!(ticket, ?delay, "reconnection scheduled");
                    self.spawn_timer(delay, Input::ReconnectDue { ticket });
                }
                Effect::ScheduleChartRetry { ticket, delay } => {
                    self.spawn_timer(delay, Input::ChartRetryDue { ticket });
                }
                Effect::Render(change) => self.ports.renderer.render(&change, self.monitor.view()),
                Effect::Notify(notice) => self.ports.renderer.notify(&notice),
            }
        }
    }

    fn spawn_request<T, Fut, F>(&self, label: &'static str, request: Fut, wrap: F)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, MonitorError>> + Send + 'static,
        F: FnOnce(Result<T, MonitorError>) -> Input + Send + 'static,
    {
        let tx = self.tx.clone();
        let limit = self.config.request_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(MonitorError::Timeout(format!("{label} request exceeded {limit:?}"))),
            };
            let _ = tx.send(wrap(result));
        });
    }

    fn spawn_timer(&self, delay: Duration, input: Input) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(input);
        });
    }

    fn open_stream(&mut self, generation: u64) {
        if let Some(previous) = self.pump.take() {
            previous.abort();
        }
        let stream = self.ports.stream.clone();
        let tx = self.tx.clone();
        let limit = self.config.request_timeout;
        let pump = async move {
            let opened = match tokio::time::timeout(limit, stream.open()).await {
                Ok(opened) => opened,
                Err(_) => Err(MonitorError::Timeout(format!("stream open exceeded {limit:?}"))),
            };
            let mut events = match opened {
                Ok(events) => events,
                Err(error) => {
                    let _ = tx.send(Input::StreamFailed { generation, error });
                    return;
                }
            };
            debug!(generation, "progress stream connected");
            while let Some(item) = events.next().await {
                match item {
                    Ok(raw) => {
                        if tx.send(Input::StreamPayload { generation, raw }).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = tx.send(Input::StreamFailed { generation, error });
                        return;
                    }
                }
            }
            let _ = tx.send(Input::StreamFailed {
                generation,
                error: MonitorError::Transport("stream closed by server".into()),
            });
        };
        self.pump = Some(tokio::spawn(pump.in_current_span()));
    }

    fn publish(&self) {
        self.snapshots.send_replace(snapshot_of(self.id, &self.monitor));
    }
}
