use clap::Parser;
use pairwatch::cli::commands::{Cli, Commands};
use pairwatch::domain::ports::execution_backend::TradeQuery;
use pairwatch::domain::values::trade_action::TradeStatus;
use pairwatch::infrastructure::render::console::ConsoleRenderer;
use pairwatch::PairWatch;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_url = cli
        .base_url
        .or_else(|| std::env::var("PAIRWATCH_BASE_URL").ok())
        .unwrap_or_else(|| pairwatch::DEFAULT_BASE_URL.into());

    let pw = PairWatch::new(&base_url);
    if let Err(e) = run_command(pw, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(pw: PairWatch, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Watch { rows } => {
            let monitor = pw.spawn_monitor(Arc::new(ConsoleRenderer::new(rows)));
            info!(id = %monitor.id(), "watching execution, Ctrl-C to quit");
            tokio::signal::ctrl_c().await?;
            monitor.dispose().await;
        }
        Commands::Status => {
            let status = pw.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Start => {
            let monitor = pw.spawn_monitor(Arc::new(ConsoleRenderer::default()));
            monitor.wait_settled().await;
            let result = monitor.start().await;
            monitor.dispose().await;
            let reply = result?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Stop => {
            let monitor = pw.spawn_monitor(Arc::new(ConsoleRenderer::default()));
            monitor.wait_settled().await;
            let result = monitor.stop().await;
            monitor.dispose().await;
            let reply = result?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            let trades = pw.closed_trades().await?;
            println!("{}", serde_json::to_string_pretty(&trades)?);
        }
        Commands::Trades {
            status,
            from,
            to,
            limit,
        } => {
            let status = status.map(|s| s.parse::<TradeStatus>()).transpose()?;
            let query = TradeQuery {
                status,
                start_date: from,
                end_date: to,
            };
            let trades = pw.trades(&query, Some(limit)).await?;
            println!("{}", serde_json::to_string_pretty(&trades)?);
        }
        Commands::Positions => {
            let positions = pw.positions().await?;
            println!("{}", serde_json::to_string_pretty(&positions)?);
        }
    }
    Ok(())
}
