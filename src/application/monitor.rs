//! Execution monitor state machine.
//!
//! The monitor holds the client's belief about the backend execution loop and
//! the view-state derived from it. It performs no I/O: every method takes a
//! completed input and returns the [`Effect`]s the driver must carry out.
//!
//! States move as follows:
//!
//! - `Reconciling` → `Running` / `Idle` when a status read answers
//! - `Idle` → `Running` on a successful start (stream opened immediately)
//! - `Running` → `Stopping` on stop, `Stopping` → `Idle` on success
//! - any state → `Reconciling` on [`ExecutionMonitor::recheck`]
//!
//! A failed reconciliation restores the belief held before the read, or
//! `Unknown` if there was none.

use crate::application::chart::ChartTracker;
use crate::application::effect::{Effect, RequestSeq};
use crate::application::stream_event::ProgressEvent;
use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::{sort_newest_first, TradeRecord};
use crate::domain::entities::view_state::{SessionWindow, ViewState};
use crate::domain::error::MonitorError;
use crate::domain::ports::execution_backend::{CommandReply, TradeQuery};
use crate::domain::ports::renderer::{Notice, ViewChange};
use crate::domain::values::cache_buster::CacheBuster;
use crate::domain::values::monitor_config::MonitorConfig;
use crate::domain::values::monitor_state::MonitorState;
use crate::domain::values::progress::ProgressView;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamSlot {
    Closed,
    /// Open or connecting.
    Open { generation: u64 },
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    status: RequestSeq,
    start: RequestSeq,
    stop: RequestSeq,
    trades: RequestSeq,
    positions: RequestSeq,
}

pub struct ExecutionMonitor {
    config: MonitorConfig,
    view: ViewState,
    /// Belief restored when a reconciliation read fails.
    fallback: MonitorState,
    stream: StreamSlot,
    stream_generation: u64,
    reconnect_ticket: Option<u64>,
    next_ticket: u64,
    seq: Sequences,
    /// Status reads up to this sequence were issued before the latest
    /// successful start or stop and no longer describe the backend.
    superseded_reads: u64,
    charts: ChartTracker,
    dropped_events: u64,
    disposed: bool,
}

impl ExecutionMonitor {
    pub fn new(config: MonitorConfig, buster: CacheBuster) -> Self {
        let charts = ChartTracker::new(buster, config.chart_retry_delay);
        Self {
            config,
            view: ViewState::default(),
            fallback: MonitorState::Unknown,
            stream: StreamSlot::Closed,
            stream_generation: 0,
            reconnect_ticket: None,
            next_ticket: 0,
            seq: Sequences::default(),
            superseded_reads: 0,
            charts,
            dropped_events: 0,
            disposed: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.view.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn chart_url(&self) -> Option<&str> {
        self.charts.current_url()
    }

    pub fn stream_open(&self) -> bool {
        matches!(self.stream, StreamSlot::Open { .. })
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_ticket.is_some()
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The settled belief: while reconciling, the one held before the read.
    pub fn belief(&self) -> MonitorState {
        match self.view.state {
            MonitorState::Reconciling => self.fallback,
            other => other,
        }
    }

    pub fn believes_running(&self) -> bool {
        self.belief() == MonitorState::Running
    }

    /// First reconciliation read on monitor start.
    pub fn initialize(&mut self) -> Vec<Effect> {
        self.fallback = MonitorState::Unknown;
        self.view.state = MonitorState::Reconciling;
        vec![
            Effect::Render(ViewChange::State(MonitorState::Reconciling)),
            Effect::FetchStatus { seq: self.seq.status.issue() },
        ]
    }

    /// Explicit re-check. An open stream is left alone unless the read disagrees.
    pub fn recheck(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        let mut fx = Vec::new();
        if self.view.state != MonitorState::Reconciling {
            self.fallback = self.view.state;
            self.set_state(MonitorState::Reconciling, &mut fx);
        }
        fx.push(Effect::FetchStatus { seq: self.seq.status.issue() });
        fx
    }

    pub fn status_completed(&mut self, seq: u64, result: Result<RunStatus, MonitorError>) -> Vec<Effect> {
        if self.disposed || !self.seq.status.accept(seq) {
            debug!(seq, "stale status read discarded");
            return vec![];
        }
        if seq <= self.superseded_reads {
            debug!(seq, "status read predates the last command, discarded");
            return vec![];
        }
        let mut fx = Vec::new();
        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "status read failed, keeping previous belief");
                if self.view.state == MonitorState::Reconciling {
                    let restored = self.fallback;
                    self.set_state(restored, &mut fx);
                }
                return fx;
            }
        };

        let running = status.running;
        let chart_ref = status.chart_ref.clone().filter(|c| !c.is_empty());
        self.view.status = status;
        fx.push(Effect::Render(ViewChange::Status));

        if self.view.state == MonitorState::Stopping {
            // the stop reply decides the transition
            return fx;
        }

        if running {
            self.set_state(MonitorState::Running, &mut fx);
            if !self.stream_open() {
                self.reconnect_ticket = None;
                self.open_stream(&mut fx);
            }
            if let Some(reference) = chart_ref {
                fx.extend(self.charts.hand_off(&reference));
            }
        } else {
            self.set_state(MonitorState::Idle, &mut fx);
            self.close_stream(&mut fx);
        }
        fx
    }

    /// Validate a start request. Returns the sequence number the reply must be reported with.
    pub fn request_start(&mut self) -> Result<(u64, Vec<Effect>), MonitorError> {
        if self.disposed {
            return Err(MonitorError::Disposed);
        }
        match self.belief() {
            MonitorState::Idle | MonitorState::Unknown => {}
            other => {
                return Err(MonitorError::InvalidState(format!(
                    "cannot start while {other}"
                )))
            }
        }
        let seq = self.seq.start.issue();
        Ok((seq, vec![Effect::SendStart { seq }]))
    }

    pub fn start_completed(&mut self, seq: u64, result: Result<CommandReply, MonitorError>) -> Vec<Effect> {
        if self.disposed || !self.seq.start.accept(seq) {
            return vec![];
        }
        let reply = match result.and_then(CommandReply::into_result) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "start failed");
                return vec![Effect::Notify(Notice::error(format!(
                    "Start failed: {}",
                    e.user_message()
                )))];
            }
        };

        self.supersede_status_reads();
        let mut fx = Vec::new();
        let window = SessionWindow {
            start_date: reply.start_date,
            end_date: reply.end_date,
        };
        info!(window = %window.describe(), "execution started");
        self.view.status = RunStatus {
            running: true,
            ..RunStatus::default()
        };
        self.view.session_window = Some(window);
        self.set_state(MonitorState::Running, &mut fx);
        fx.push(Effect::Render(ViewChange::Status));
        fx.push(Effect::Render(ViewChange::SessionWindow));
        if !self.stream_open() {
            self.reconnect_ticket = None;
            self.open_stream(&mut fx);
        }
        if let Some(initial) = self.config.initial_chart.clone() {
            fx.extend(self.charts.hand_off(&initial));
        }
        fx.push(Effect::Notify(Notice::success(reply.message)));
        fx
    }

    pub fn request_stop(&mut self) -> Result<(u64, Vec<Effect>), MonitorError> {
        if self.disposed {
            return Err(MonitorError::Disposed);
        }
        if !self.believes_running() {
            return Err(MonitorError::InvalidState(format!(
                "cannot stop while {}",
                self.belief()
            )));
        }
        let mut fx = Vec::new();
        self.set_state(MonitorState::Stopping, &mut fx);
        self.reconnect_ticket = None;
        let seq = self.seq.stop.issue();
        fx.push(Effect::SendStop { seq });
        Ok((seq, fx))
    }

    pub fn stop_completed(&mut self, seq: u64, result: Result<CommandReply, MonitorError>) -> Vec<Effect> {
        if self.disposed || !self.seq.stop.accept(seq) {
            return vec![];
        }
        let mut fx = Vec::new();
        let reply = match result.and_then(CommandReply::into_result) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "stop failed");
                match self.view.state {
                    MonitorState::Stopping => self.set_state(MonitorState::Running, &mut fx),
                    MonitorState::Reconciling if self.fallback == MonitorState::Stopping => {
                        self.fallback = MonitorState::Running
                    }
                    _ => {}
                }
                // a stream lost while stopping is picked up by the reconnection policy
                if self.believes_running() && !self.stream_open() {
                    self.schedule_reconnect(&mut fx);
                }
                fx.push(Effect::Notify(Notice::error(format!(
                    "Stop failed: {}",
                    e.user_message()
                ))));
                return fx;
            }
        };

        info!("execution stopped");
        self.supersede_status_reads();
        self.fallback = MonitorState::Idle;
        self.set_state(MonitorState::Idle, &mut fx);
        self.close_stream(&mut fx);
        self.view.status.running = false;
        if !self.view.positions.is_empty() {
            self.view.positions.clear();
            fx.push(Effect::Render(ViewChange::Positions));
        }
        fx.push(Effect::LoadTrades {
            seq: self.seq.trades.issue(),
            query: TradeQuery::closed(),
        });
        fx.push(Effect::Notify(Notice::success(reply.message)));
        fx
    }

    /// Apply one raw push event. Malformed payloads are dropped on their own.
    pub fn stream_payload(&mut self, generation: u64, raw: &str) -> Vec<Effect> {
        if self.disposed || self.stream != (StreamSlot::Open { generation }) {
            debug!(generation, "event from a closed stream discarded");
            return vec![];
        }
        match ProgressEvent::parse(raw) {
            Ok(event) if event.is_empty() => {
                debug!(generation, "empty stream event ignored");
                vec![]
            }
            Ok(event) => self.apply_event(event),
            Err(e) => {
                self.dropped_events += 1;
                warn!(error = %e, payload = %raw, "dropping malformed stream event");
                vec![]
            }
        }
    }

    /// Field-wise overwrite of the cached view-state.
    pub fn apply_event(&mut self, event: ProgressEvent) -> Vec<Effect> {
        let mut fx = Vec::new();
        let status = &mut self.view.status;
        status.running = true;

        if event.progress.is_some() || event.date.is_some() {
            if let Some(progress) = event.progress {
                status.progress = Some(progress);
            }
            if let Some(date) = event.date {
                status.current_label = Some(date);
            }
            if let Some(progress) = status.progress {
                fx.push(Effect::Render(ViewChange::Progress(ProgressView::new(
                    progress,
                    status.current_label.clone(),
                ))));
            }
        }
        if let Some(metrics) = event.metrics {
            status.metrics = Some(metrics.clone());
            fx.push(Effect::Render(ViewChange::Metrics(metrics)));
        }
        if let Some(chart) = event.chart_url {
            status.chart_ref = Some(chart.clone());
            fx.extend(self.charts.hand_off(&chart));
        }
        if let Some(trades) = event.trades {
            self.view.trades = trades;
            fx.push(Effect::Render(ViewChange::Trades));
        }
        fx
    }

    /// Transport failure on the stream. The belief stays `Running`.
    pub fn stream_failed(&mut self, generation: u64, error: &MonitorError) -> Vec<Effect> {
        if self.disposed || self.stream != (StreamSlot::Open { generation }) {
            return vec![];
        }
        warn!(generation, error = %error, "progress stream lost");
        self.stream = StreamSlot::Closed;
        let mut fx = Vec::new();
        if self.believes_running() {
            self.schedule_reconnect(&mut fx);
        }
        fx
    }

    pub fn reconnect_due(&mut self, ticket: u64) -> Vec<Effect> {
        if self.disposed || self.reconnect_ticket != Some(ticket) {
            debug!(ticket, "cancelled reconnection ignored");
            return vec![];
        }
        self.reconnect_ticket = None;
        let mut fx = Vec::new();
        if self.believes_running() && !self.stream_open() {
            info!("reconnecting progress stream");
            self.open_stream(&mut fx);
        }
        fx
    }

    pub fn chart_resolved(&mut self, ticket: u64, ok: bool) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.charts.resolved(ticket, ok)
    }

    pub fn chart_retry_due(&mut self, ticket: u64) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.charts.retry_due(ticket)
    }

    /// Periodic tick: positions while running, and a silent reconciliation
    /// read whenever no stream is open.
    pub fn poll_tick(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        let mut fx = Vec::new();
        if self.believes_running() && !self.seq.positions.in_flight() {
            fx.push(Effect::LoadPositions { seq: self.seq.positions.issue() });
        }
        let quiet_state = matches!(
            self.view.state,
            MonitorState::Idle | MonitorState::Unknown | MonitorState::Running
        );
        if quiet_state && !self.stream_open() && !self.seq.status.in_flight() {
            fx.push(Effect::FetchStatus { seq: self.seq.status.issue() });
        }
        fx
    }

    pub fn positions_completed(&mut self, seq: u64, result: Result<Vec<Position>, MonitorError>) -> Vec<Effect> {
        if self.disposed || !self.seq.positions.accept(seq) {
            return vec![];
        }
        match result {
            Ok(positions) if self.believes_running() => {
                self.view.positions = positions;
                vec![Effect::Render(ViewChange::Positions)]
            }
            Ok(_) => vec![],
            Err(e) => {
                warn!(error = %e, "positions load failed");
                vec![]
            }
        }
    }

    pub fn trades_completed(&mut self, seq: u64, result: Result<Vec<TradeRecord>, MonitorError>) -> Vec<Effect> {
        if self.disposed || !self.seq.trades.accept(seq) {
            return vec![];
        }
        match result {
            Ok(mut trades) => {
                sort_newest_first(&mut trades);
                self.view.trades = trades;
                vec![Effect::Render(ViewChange::Trades)]
            }
            Err(e) => {
                warn!(error = %e, "trade history load failed");
                vec![]
            }
        }
    }

    /// Tear down: closes the stream and ignores every later input.
    pub fn dispose(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        let mut fx = Vec::new();
        self.close_stream(&mut fx);
        self.reconnect_ticket = None;
        self.disposed = true;
        fx
    }

    fn supersede_status_reads(&mut self) {
        self.superseded_reads = self.seq.status.issued();
    }

    fn set_state(&mut self, next: MonitorState, fx: &mut Vec<Effect>) {
        if self.view.state != next {
            debug!(from = %self.view.state, to = %next, "state change");
            self.view.state = next;
            fx.push(Effect::Render(ViewChange::State(next)));
        }
    }

    fn open_stream(&mut self, fx: &mut Vec<Effect>) {
        if self.stream_open() {
            fx.push(Effect::CloseStream);
        }
        self.stream_generation += 1;
        let generation = self.stream_generation;
        self.stream = StreamSlot::Open { generation };
        fx.push(Effect::OpenStream { generation });
    }

    fn close_stream(&mut self, fx: &mut Vec<Effect>) {
        self.reconnect_ticket = None;
        if self.stream_open() {
            self.stream = StreamSlot::Closed;
            fx.push(Effect::CloseStream);
        }
    }

    fn schedule_reconnect(&mut self, fx: &mut Vec<Effect>) {
        if self.reconnect_ticket.is_some() {
            return;
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.reconnect_ticket = Some(ticket);
        fx.push(Effect::ScheduleReconnect {
            ticket,
            delay: self.config.reconnect_delay,
        });
    }
}
