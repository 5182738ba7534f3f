//! CLI interface for dinedash
//!
//! Every screen of the dashboard is a subcommand. Without one, the Tap &
//! Collect orders are shown. Global flags choose the API host, the date
//! range, the timezone and the output format; `--watch` keeps the screen
//! refreshing until Ctrl+C.
//!
//! # Example
//!
//! ```bash
//! # Delivery orders from the last 3 days, refreshed every 10 seconds
//! dinedash delivery --range 3days --watch
//!
//! # Analytics summary for today as JSON
//! dinedash analytics --range today --json
//!
//! # Tell a customer their order will be ready in 20 minutes
//! dinedash estimate 65f1c0ffee --minutes 20
//! ```

use clap::{Parser, Subcommand};
use dinedash_api::DEFAULT_API_URL;
use dinedash_core::error::{DashboardError, Result};
use dinedash_core::store::{AnalyticsTab, View};
use dinedash_core::types::EstimateMinutes;
use dinedash_core::window::DateFilter;
use tracing::warn;

/// Terminal back office for restaurant orders and reservations
#[derive(Parser, Debug, Clone)]
#[command(name = "dinedash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Base URL of the back-office API
    #[arg(long, global = true, env = "DINEDASH_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Seconds between refreshes in watch mode
    #[arg(
        long,
        global = true,
        env = "DINEDASH_INTERVAL",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// HTTP request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "DINEDASH_TIMEOUT",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Timezone for dates and day buckets (e.g. "Europe/London", "UTC")
    /// If not specified, uses TZ or the system's local timezone
    #[arg(long, short = 'z', global = true, env = "DINEDASH_TIMEZONE")]
    pub timezone: Option<String>,

    /// Use UTC (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Date range: all, today, 1day, 3days, 1week, 15days or 1month
    /// Unrecognized values show all dates
    #[arg(long, global = true)]
    pub range: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep refreshing until Ctrl+C
    #[arg(long, short = 'w', global = true)]
    pub watch: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Tap & Collect orders (default)
    Pickup,

    /// Delivery orders
    Delivery,

    /// Table reservations
    Reservations,

    /// Charts and summary figures
    Analytics {
        /// Which analytics tab to show
        #[arg(long, default_value = "summary", value_parser = parse_analytics_tab)]
        tab: AnalyticsTab,
    },

    /// Mark an order as delivered or collected
    ///
    /// Only the server is updated. The local copy of the order is patched
    /// when the action runs inside a long-lived process; a one-shot command
    /// shows the change on the next load.
    Deliver {
        /// Order identifier
        order_id: String,
    },

    /// Email a preparation-time estimate to the customer of an order
    ///
    /// The record of sent estimates lives in process memory, so a one-shot
    /// command cannot tell whether an estimate was already sent by an
    /// earlier invocation.
    Estimate {
        /// Order identifier
        order_id: String,

        /// Estimate to send: 10, 20 or 30 minutes
        #[arg(long, short = 'm', value_parser = parse_estimate_minutes)]
        minutes: Option<EstimateMinutes>,
    },
}

impl Cli {
    /// Screen selected by the subcommand
    pub fn view(&self) -> View {
        match &self.command {
            None | Some(Command::Pickup) => View::TapAndCollect,
            Some(Command::Delivery) => View::DeliveryOrders,
            Some(Command::Reservations) => View::Reservations,
            Some(Command::Analytics { .. }) => View::VisualData,
            Some(Command::Deliver { .. } | Command::Estimate { .. }) => View::TapAndCollect,
        }
    }

    /// Analytics tab, summary unless chosen
    pub fn analytics_tab(&self) -> AnalyticsTab {
        match &self.command {
            Some(Command::Analytics { tab }) => *tab,
            _ => AnalyticsTab::default(),
        }
    }

    /// Date range from `--range`, if given
    pub fn date_filter(&self) -> Option<DateFilter> {
        self.range.as_deref().map(parse_date_filter)
    }
}

/// Parse a date-range selection
///
/// Never fails: unknown values fall back to all dates with a warning.
///
/// # Example
/// ```
/// use dinedash::cli::parse_date_filter;
/// use dinedash::DateFilter;
///
/// assert_eq!(parse_date_filter("3days"), DateFilter::Last3Days);
/// assert_eq!(parse_date_filter("Last 15 Days"), DateFilter::Last15Days);
/// assert_eq!(parse_date_filter("fortnight"), DateFilter::All);
/// ```
pub fn parse_date_filter(value: &str) -> DateFilter {
    let filter = DateFilter::from_selection(value);
    if filter == DateFilter::All && !value.trim().eq_ignore_ascii_case("all") {
        warn!("Unrecognized date range '{}', showing all dates", value);
    }
    filter
}

/// Parse an estimate in minutes ("20" or "20 minutes")
pub fn parse_estimate_minutes(value: &str) -> Result<EstimateMinutes> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_suffix("minutes")
        .or_else(|| trimmed.strip_suffix("min"))
        .or_else(|| trimmed.strip_suffix('m'))
        .unwrap_or(trimmed)
        .trim();

    digits
        .parse::<u32>()
        .ok()
        .and_then(EstimateMinutes::new)
        .ok_or_else(|| {
            DashboardError::InvalidArgument(format!(
                "Invalid estimate '{value}', expected 10, 20 or 30 minutes"
            ))
        })
}

/// Parse an analytics tab name
pub fn parse_analytics_tab(value: &str) -> Result<AnalyticsTab> {
    value.parse()
}
