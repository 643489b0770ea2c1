use crate::domain::ports::execution_backend::TradeQuery;
use crate::domain::ports::renderer::{Notice, ViewChange};
use std::time::Duration;

/// Work the execution monitor asks its driver to perform.
///
/// Every request carries the sequence number or ticket the matching
/// completion must be reported with.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStatus { seq: u64 },
    SendStart { seq: u64 },
    SendStop { seq: u64 },
    /// Close any open stream first, then connect.
    OpenStream { generation: u64 },
    CloseStream,
    ScheduleReconnect { ticket: u64, delay: Duration },
    LoadTrades { seq: u64, query: TradeQuery },
    LoadPositions { seq: u64 },
    ResolveChart { ticket: u64, url: String },
    ScheduleChartRetry { ticket: u64, delay: Duration },
    Render(ViewChange),
    Notify(Notice),
}

/// Per-operation sequence numbers.
///
/// A completion is applied only if no newer request of the same kind has
/// completed already.
#[derive(Debug, Clone, Default)]
pub struct RequestSeq {
    issued: u64,
    completed: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn accept(&mut self, seq: u64) -> bool {
        if seq > self.completed {
            self.completed = seq;
            true
        } else {
            false
        }
    }

    /// Most recently issued sequence number.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn in_flight(&self) -> bool {
        self.issued > self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_older_completion_after_newer_is_discarded() {
        let mut seq = RequestSeq::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(seq.in_flight());
        assert!(seq.accept(second));
        assert!(!seq.accept(first));
        assert!(!seq.in_flight());
    }

    #[test]
    fn test_completions_in_issue_order_all_apply() {
        let mut seq = RequestSeq::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(seq.accept(first));
        assert!(seq.in_flight());
        assert!(seq.accept(second));
    }
}
