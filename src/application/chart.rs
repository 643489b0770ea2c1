//! Chart-reference freshness.
//!
//! Each reference handed to the renderer is stamped with a fresh
//! cache-defeating token. If the stamped URL does not resolve, it is retried
//! exactly once with a new token; after that the next naturally arriving
//! reference takes over.

use crate::application::effect::Effect;
use crate::domain::ports::renderer::ViewChange;
use crate::domain::values::cache_buster::CacheBuster;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct ChartAttempt {
    ticket: u64,
    reference: String,
    url: String,
    retried: bool,
}

#[derive(Debug, Clone)]
pub struct ChartTracker {
    buster: CacheBuster,
    retry_delay: Duration,
    current: Option<ChartAttempt>,
    next_ticket: u64,
}

impl ChartTracker {
    pub fn new(buster: CacheBuster, retry_delay: Duration) -> Self {
        Self {
            buster,
            retry_delay,
            current: None,
            next_ticket: 0,
        }
    }

    /// URL most recently handed to the renderer.
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.url.as_str())
    }

    /// Supersedes any earlier reference, including one waiting for its retry.
    pub fn hand_off(&mut self, reference: &str) -> Vec<Effect> {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let url = self.buster.stamp(reference);
        debug!(%url, "chart reference handed off");
        self.current = Some(ChartAttempt {
            ticket,
            reference: reference.to_string(),
            url: url.clone(),
            retried: false,
        });
        vec![
            Effect::Render(ViewChange::Chart(url.clone())),
            Effect::ResolveChart { ticket, url },
        ]
    }

    pub fn resolved(&mut self, ticket: u64, ok: bool) -> Vec<Effect> {
        let Some(current) = self.current.as_ref().filter(|c| c.ticket == ticket) else {
            return vec![];
        };
        if ok {
            debug!(url = %current.url, "chart resolved");
            return vec![];
        }
        if current.retried {
            warn!(url = %current.url, "chart still unavailable after retry, waiting for next update");
            return vec![];
        }
        debug!(url = %current.url, "chart not ready, scheduling retry");
        vec![Effect::ScheduleChartRetry {
            ticket,
            delay: self.retry_delay,
        }]
    }

    pub fn retry_due(&mut self, ticket: u64) -> Vec<Effect> {
        let Some(current) = self.current.as_mut().filter(|c| c.ticket == ticket && !c.retried) else {
            return vec![];
        };
        current.retried = true;
        current.url = self.buster.restamp(&current.reference);
        let url = current.url.clone();
        vec![
            Effect::Render(ViewChange::Chart(url.clone())),
            Effect::ResolveChart { ticket, url },
        ]
    }
}
