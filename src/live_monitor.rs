//! Live monitoring for dinedash
//!
//! Runs the refresh loop on a fixed interval and redraws the current
//! screen after every cycle until Ctrl+C.

use chrono::Utc;
use chrono_tz::Tz;
use dinedash_api::DashboardApi;
use dinedash_core::error::Result;
use dinedash_core::store::AnalyticsTab;
use dinedash_terminal::output::get_formatter;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::refresh::{CycleOutcome, RefreshLoop};

/// Watch-mode driver
pub struct LiveMonitor<A: DashboardApi> {
    refresh: RefreshLoop<A>,
    tz: Tz,
    tab: AnalyticsTab,
    json_output: bool,
    interval: Duration,
}

impl<A: DashboardApi> LiveMonitor<A> {
    /// Create a new live monitor
    pub fn new(
        refresh: RefreshLoop<A>,
        tz: Tz,
        tab: AnalyticsTab,
        json_output: bool,
        interval: Duration,
    ) -> Self {
        Self {
            refresh,
            tz,
            tab,
            json_output,
            interval,
        }
    }

    /// Start the live monitoring loop, stopping on Ctrl+C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run cycles until `shutdown` completes
    ///
    /// The first cycle starts immediately, then one per interval. Shutdown
    /// also interrupts a cycle that is still waiting on the API.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.refresh.activate();

        // The first tick completes immediately, giving the initial cycle
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tokio::select! {
                        outcome = self.refresh.run_cycle() => {
                            debug!(?outcome, "Watch cycle finished");
                            if outcome != CycleOutcome::Discarded {
                                self.refresh_display().await;
                            }
                        }
                        _ = &mut shutdown => break,
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.refresh.deactivate();
        if !self.json_output {
            println!("\nExiting live monitoring mode...");
        }
        Ok(())
    }

    /// Redraw the current screen
    async fn refresh_display(&self) {
        let state = self.refresh.store().read().await;
        let formatter = get_formatter(self.json_output);
        let screen = formatter.format_screen(&state, Utc::now(), &self.tz, self.tab);

        if self.json_output {
            println!("{screen}");
            return;
        }

        print!("\x1B[2J\x1B[1;1H"); // Clear screen and move cursor to top-left
        println!(
            "Live Monitoring | Refresh interval: {}s | Press Ctrl+C to exit",
            self.interval.as_secs()
        );
        println!("{}", "-".repeat(80));
        println!("{screen}");
    }
}
