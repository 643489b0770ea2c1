use crate::domain::entities::view_state::ViewState;
use crate::domain::ports::renderer::{Notice, NoticeLevel, Renderer, ViewChange};
use crate::domain::values::monitor_state::MonitorState;

/// Line-oriented terminal display.
pub struct ConsoleRenderer {
    /// Maximum trade rows printed per update.
    trade_rows: usize,
}

impl ConsoleRenderer {
    pub fn new(trade_rows: usize) -> Self {
        Self { trade_rows }
    }

    fn print_trades(&self, view: &ViewState) {
        if view.trades.is_empty() {
            println!("  no trades");
            return;
        }
        println!(
            "  {:<10} {:<16} {:<6} {:<8} {:<8} {:>10} {:>10}",
            "date", "pair", "action", "long", "short", "quantity", "pnl"
        );
        for t in view.trades.iter().take(self.trade_rows) {
            let pnl = t
                .realized_pnl()
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".into());
            println!(
                "  {:<10} {:<16} {:<6} {:<8} {:<8} {:>10.2} {:>10}",
                t.display_date(),
                t.pair_id,
                t.action.label(),
                t.long_code,
                t.short_code,
                t.quantity,
                pnl
            );
        }
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, change: &ViewChange, view: &ViewState) {
        match change {
            ViewChange::State(state) => {
                let label = match state {
                    MonitorState::Running => "running",
                    MonitorState::Idle => "stopped",
                    MonitorState::Stopping => "stopping...",
                    MonitorState::Reconciling => "checking status...",
                    MonitorState::Unknown => "status unknown",
                };
                println!("[execution] {label}");
            }
            ViewChange::Status => {
                if let Some(progress) = view.status.progress_view() {
                    match progress.date_label() {
                        Some(date) => println!("[progress] {} (current date: {date})", progress.percent_text()),
                        None => println!("[progress] {}", progress.percent_text()),
                    }
                }
                if let Some(metrics) = &view.status.metrics {
                    for (label, value) in metrics.rows() {
                        println!("  {label:<18} {value}");
                    }
                }
            }
            ViewChange::Progress(progress) => match progress.date_label() {
                Some(date) => println!("[progress] {} (current date: {date})", progress.percent_text()),
                None => println!("[progress] {}", progress.percent_text()),
            },
            ViewChange::Metrics(metrics) => {
                println!("[metrics]");
                for (label, value) in metrics.rows() {
                    println!("  {label:<18} {value}");
                }
            }
            ViewChange::Trades => {
                println!("[trades]");
                self.print_trades(view);
            }
            ViewChange::Positions => {
                println!("[positions] {}", view.positions.len());
                for p in &view.positions {
                    println!(
                        "  {:<16} long {:<8} short {:<8} qty {:>10.2} since {}",
                        p.pair_id,
                        p.stock1_code,
                        p.stock2_code,
                        p.quantity,
                        p.open_time.as_deref().unwrap_or("-")
                    );
                }
            }
            ViewChange::SessionWindow => {
                if let Some(window) = &view.session_window {
                    println!("[execution] window {}", window.describe());
                }
            }
            ViewChange::Chart(url) => println!("[chart] {url}"),
        }
    }

    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            NoticeLevel::Success => println!("ok: {}", notice.message),
        }
    }
}
