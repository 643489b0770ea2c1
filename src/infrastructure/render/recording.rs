use crate::domain::entities::view_state::ViewState;
use crate::domain::ports::renderer::{Notice, Renderer, ViewChange};
use std::sync::Mutex;

/// Keeps every notification in memory for assertions in tests. Unbounded.
#[derive(Default)]
pub struct RecordingRenderer {
    changes: Mutex<Vec<ViewChange>>,
    notices: Mutex<Vec<Notice>>,
    last_view: Mutex<Option<ViewState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<ViewChange> {
        self.changes.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Chart URLs in the order they were handed over.
    pub fn chart_urls(&self) -> Vec<String> {
        self.changes()
            .into_iter()
            .filter_map(|c| match c {
                ViewChange::Chart(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn last_view(&self) -> Option<ViewState> {
        self.last_view.lock().ok().and_then(|v| v.clone())
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, change: &ViewChange, view: &ViewState) {
        if let Ok(mut changes) = self.changes.lock() {
            changes.push(change.clone());
        }
        if let Ok(mut last) = self.last_view.lock() {
            *last = Some(view.clone());
        }
    }

    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
