//! dinedash - Terminal back office for restaurant orders and reservations

use chrono::Utc;
use clap::Parser;
use dinedash::{
    api::{DashboardApi, HttpApi},
    cli::{Cli, Command},
    error::{DashboardError, Result},
    live_monitor::LiveMonitor,
    output::get_formatter,
    refresh::{CycleOutcome, RefreshLoop, new_store},
    store::DashboardState,
    timezone::TimezoneConfig,
    types::OrderId,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run one cycle, with a spinner on a terminal
async fn initial_load<A: DashboardApi>(refresh: &RefreshLoop<A>, show_progress: bool) -> CycleOutcome {
    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
        {
            pb.set_style(style);
        }
        pb.set_message("Loading orders and reservations");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let outcome = refresh.run_cycle().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.verbose { "dinedash=info" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let tz_config = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
    info!("Using timezone: {}", tz_config.display_name());
    let tz = tz_config.tz;

    let api = Arc::new(HttpApi::new(
        cli.api_url.as_str(),
        Duration::from_secs(cli.timeout),
    )?);
    let store = new_store(DashboardState::new().with_view(cli.view(), cli.date_filter()));
    let refresh = RefreshLoop::new(api, store.clone(), tz);
    let formatter = get_formatter(cli.json);
    let show_progress = !cli.json && !cli.watch && is_terminal::is_terminal(std::io::stdout());

    match &cli.command {
        Some(Command::Deliver { order_id }) => {
            let order_id = OrderId::new(order_id.as_str());
            refresh.mark_delivered(&order_id).await?;
            println!(
                "{}",
                formatter.format_notice(&format!("Order {order_id} marked as delivered"))
            );
        }
        Some(Command::Estimate { order_id, minutes }) => {
            let order_id = OrderId::new(order_id.as_str());
            refresh.activate();
            let outcome = initial_load(&refresh, show_progress).await;
            refresh.deactivate();
            if let CycleOutcome::Failed(message) = outcome {
                return Err(DashboardError::Refresh(message));
            }

            let sent = refresh.send_time_estimate(&order_id, *minutes).await?;
            println!(
                "{}",
                formatter.format_notice(&format!(
                    "Estimate for order {order_id}: {}",
                    sent.describe(&tz)
                ))
            );
        }
        _ if cli.watch => {
            info!("Starting live monitoring mode");
            let monitor = LiveMonitor::new(
                refresh,
                tz,
                cli.analytics_tab(),
                cli.json,
                Duration::from_secs(cli.interval),
            );
            monitor.run().await?;
        }
        _ => {
            info!("Showing {}", cli.view());
            refresh.activate();
            initial_load(&refresh, show_progress).await;
            refresh.deactivate();

            let state = store.read().await;
            println!(
                "{}",
                formatter.format_screen(&state, Utc::now(), &tz, cli.analytics_tab())
            );
        }
    }

    Ok(())
}
