use super::sse::SseDecoder;
use crate::domain::entities::position::Position;
use crate::domain::entities::run_status::RunStatus;
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::error::MonitorError;
use crate::domain::ports::chart_probe::ChartProbe;
use crate::domain::ports::execution_backend::{CommandReply, ExecutionBackend, TradeQuery};
use crate::domain::ports::progress_stream::{EventStream, ProgressStream};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the pairs-trading backend.
///
/// Request timeouts are applied per request rather than on the client so the
/// long-lived progress stream is not cut off.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent("pairwatch/0.1")
                .connect_timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path or a relative resource reference.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, MonitorError> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::decode(path, resp).await
    }

    async fn post_command(&self, path: &str) -> Result<CommandReply, MonitorError> {
        let resp = self
            .client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T, MonitorError> {
        let status = resp.status();
        if !status.is_success() {
            // command endpoints report failures in the body with a 4xx/5xx
            let body = resp.text().await.unwrap_or_default();
            if let Ok(value) = serde_json::from_str::<T>(&body) {
                return Ok(value);
            }
            return Err(MonitorError::Transport(format!("{path} returned {status}: {body}")));
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| MonitorError::Malformed(format!("{path}: {e}")))
    }
}

#[async_trait]
impl ExecutionBackend for HttpBackend {
    async fn status(&self) -> Result<RunStatus, MonitorError> {
        self.get_json("/api/execution/status", &[]).await
    }

    async fn start(&self) -> Result<CommandReply, MonitorError> {
        self.post_command("/api/execution/start").await
    }

    async fn stop(&self) -> Result<CommandReply, MonitorError> {
        self.post_command("/api/execution/stop").await
    }

    async fn trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, MonitorError> {
        self.get_json("/api/trades", &query.params()).await
    }

    async fn positions(&self) -> Result<Vec<Position>, MonitorError> {
        self.get_json("/api/positions", &[]).await
    }
}

#[async_trait]
impl ChartProbe for HttpBackend {
    async fn resolve(&self, url: &str) -> Result<(), MonitorError> {
        let resp = self
            .client
            .get(self.url(url))
            .timeout(self.timeout)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(MonitorError::Transport(format!("chart {url} returned {}", resp.status())))
        }
    }
}

#[async_trait]
impl ProgressStream for HttpBackend {
    async fn open(&self) -> Result<EventStream, MonitorError> {
        let url = self.url("/api/execution/progress");
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MonitorError::Transport(format!(
                "progress stream returned {}",
                resp.status()
            )));
        }
        debug!(%url, "progress stream response received");

        let events = resp
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let items: Vec<Result<String, MonitorError>> = match chunk {
                    Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(MonitorError::from(e))],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten()
            .boxed();
        Ok(events)
    }
}
