pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::runtime::{MonitorHandle, MonitorPorts};
use crate::application::trades::TradeHistoryUseCase;
use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::error::MonitorError;
use crate::domain::ports::chart_probe::ChartProbe;
use crate::domain::ports::execution_backend::{ExecutionBackend, TradeQuery};
use crate::domain::ports::progress_stream::ProgressStream;
use crate::domain::ports::renderer::Renderer;
use crate::domain::values::monitor_config::MonitorConfig;
use crate::infrastructure::http::client::HttpBackend;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

pub struct PairWatch {
    backend: Arc<dyn ExecutionBackend>,
    stream: Arc<dyn ProgressStream>,
    charts: Arc<dyn ChartProbe>,
    config: MonitorConfig,
    history_uc: TradeHistoryUseCase,
}

impl PairWatch {
    /// HTTP-backed instance. Tunables come from `PAIRWATCH_*` environment variables.
    pub fn new(base_url: &str) -> Self {
        let config = config_from_env();
        let http = Arc::new(HttpBackend::new(base_url, config.request_timeout));
        Self::with_ports(http.clone(), http.clone(), http, config)
    }

    pub fn with_ports(
        backend: Arc<dyn ExecutionBackend>,
        stream: Arc<dyn ProgressStream>,
        charts: Arc<dyn ChartProbe>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            history_uc: TradeHistoryUseCase::new(backend.clone()),
            backend,
            stream,
            charts,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Create an execution monitor rendering to `renderer`.
    pub fn spawn_monitor(&self, renderer: Arc<dyn Renderer>) -> MonitorHandle {
        MonitorHandle::spawn(
            self.config.clone(),
            MonitorPorts {
                backend: self.backend.clone(),
                stream: self.stream.clone(),
                charts: self.charts.clone(),
                renderer,
            },
        )
    }

    // Delegating methods
    pub async fn status(&self) -> Result<RunStatus, MonitorError> {
        self.backend.status().await
    }

    pub async fn trades(&self, query: &TradeQuery, limit: Option<usize>) -> Result<Vec<TradeRecord>, MonitorError> {
        self.history_uc.list(query, limit).await
    }

    pub async fn closed_trades(&self) -> Result<Vec<TradeRecord>, MonitorError> {
        self.history_uc.closed().await
    }

    pub async fn positions(&self) -> Result<Vec<Position>, MonitorError> {
        self.history_uc.positions().await
    }
}

fn config_from_env() -> MonitorConfig {
    let defaults = MonitorConfig::default();
    let initial_chart = match std::env::var("PAIRWATCH_INITIAL_CHART") {
        Ok(path) if path.is_empty() => None,
        Ok(path) => Some(path),
        Err(_) => defaults.initial_chart.clone(),
    };
    MonitorConfig {
        reconnect_delay: env_secs("PAIRWATCH_RECONNECT_SECS", defaults.reconnect_delay),
        chart_retry_delay: env_secs("PAIRWATCH_CHART_RETRY_SECS", defaults.chart_retry_delay),
        poll_interval: env_secs("PAIRWATCH_POLL_SECS", defaults.poll_interval),
        request_timeout: env_secs("PAIRWATCH_TIMEOUT_SECS", defaults.request_timeout),
        initial_chart,
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<f64>() {
            Ok(secs) if secs > 0.0 && secs.is_finite() => Duration::from_secs_f64(secs),
            _ => {
                warn!(%key, value = %raw, "ignoring invalid duration, using default");
                default
            }
        },
        Err(_) => default,
    }
}
