use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pairwatch", about = "Monitor and control a pairs-trading execution backend")]
pub struct Cli {
    /// Backend base URL (overrides PAIRWATCH_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow the execution: status, progress stream, trades and chart, until Ctrl-C
    Watch {
        /// Trade rows shown per update
        #[arg(long, default_value = "10")]
        rows: usize,
    },
    /// One reconciliation read, printed as JSON
    Status,
    /// Start the execution loop
    Start,
    /// Stop the execution loop and print the final closed trades
    Stop,
    /// List trades, newest first
    Trades {
        /// Trade status filter (open, closed)
        #[arg(long)]
        status: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show open positions
    Positions,
}
