use std::time::Duration;

/// Tunables for the execution monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay before reopening a push stream after a transport error.
    pub reconnect_delay: Duration,
    /// Delay before the single retry of a chart reference that failed to resolve.
    pub chart_retry_delay: Duration,
    /// Cadence of the auxiliary poll (positions, and status reads while no stream is open).
    pub poll_interval: Duration,
    /// Upper bound on any single HTTP request.
    pub request_timeout: Duration,
    /// Chart shown right after a successful start, before the stream delivers one.
    pub initial_chart: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            chart_retry_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            initial_chart: Some("static/execution_results.png".into()),
        }
    }
}
