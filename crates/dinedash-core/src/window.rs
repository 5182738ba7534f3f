//! Date-filter selections and the windows they resolve to
//!
//! A [`DateFilter`] is what staff pick from a menu ("last 3 days",
//! "today", ...). [`TimeWindow::resolve`] turns it into something a record
//! can be tested against, given the current instant and the viewer's
//! timezone.
//!
//! Rolling windows are calendar arithmetic in the viewer's timezone: "last
//! 3 days" at 18:00 on the 15th starts at 18:00 on the 12th, even across a
//! daylight-saving change. Subtracting a month clamps to the end of the
//! shorter month, so the window ending 31 March starts 29 February in a
//! leap year.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use dinedash_core::window::{DateFilter, TimeWindow};
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
//! let window = TimeWindow::resolve(DateFilter::LastMonth, now, &chrono_tz::UTC);
//! assert_eq!(
//!     window,
//!     TimeWindow::Since(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
//! );
//! ```

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::types::DailyDate;

/// A symbolic date-range selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    /// No lower bound
    #[default]
    All,
    /// Same calendar day as now
    Today,
    /// Rolling 1 day
    #[serde(rename = "1day")]
    LastDay,
    /// Rolling 3 days
    #[serde(rename = "3days")]
    Last3Days,
    /// Rolling 7 days
    #[serde(rename = "1week")]
    LastWeek,
    /// Rolling 15 days
    #[serde(rename = "15days")]
    Last15Days,
    /// Rolling calendar month
    #[serde(rename = "1month")]
    LastMonth,
}

impl DateFilter {
    /// Selections offered by the order and reservation tables
    pub const TABLE_CHOICES: [DateFilter; 6] = [
        DateFilter::All,
        DateFilter::LastDay,
        DateFilter::Last3Days,
        DateFilter::LastWeek,
        DateFilter::Last15Days,
        DateFilter::LastMonth,
    ];

    /// Selections offered by the analytics view
    pub const ANALYTICS_CHOICES: [DateFilter; 4] = [
        DateFilter::Today,
        DateFilter::Last3Days,
        DateFilter::Last15Days,
        DateFilter::LastMonth,
    ];

    /// Default selection for the analytics view
    pub const ANALYTICS_DEFAULT: DateFilter = DateFilter::Last15Days;

    /// Parse a selection, mapping anything unrecognized to [`DateFilter::All`]
    ///
    /// Accepts the short keys (`3days`), kebab-case (`last-3-days`) and the
    /// menu labels (`Last 3 Days`), case-insensitively.
    pub fn from_selection(value: &str) -> Self {
        let key: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let key = key.strip_prefix("last").unwrap_or(&key);

        match key {
            "all" | "alldates" | "" => DateFilter::All,
            "today" => DateFilter::Today,
            "1day" | "day" => DateFilter::LastDay,
            "3days" => DateFilter::Last3Days,
            "1week" | "week" | "7days" => DateFilter::LastWeek,
            "15days" => DateFilter::Last15Days,
            "1month" | "month" => DateFilter::LastMonth,
            other => {
                debug!("Unrecognized date filter '{}', showing all dates", other);
                DateFilter::All
            }
        }
    }

    /// Short key used on the command line and in JSON
    pub fn key(&self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Today => "today",
            DateFilter::LastDay => "1day",
            DateFilter::Last3Days => "3days",
            DateFilter::LastWeek => "1week",
            DateFilter::Last15Days => "15days",
            DateFilter::LastMonth => "1month",
        }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::All => "All dates",
            DateFilter::Today => "Today",
            DateFilter::LastDay => "Last 1 day",
            DateFilter::Last3Days => "Last 3 days",
            DateFilter::LastWeek => "Last 1 week",
            DateFilter::Last15Days => "Last 15 days",
            DateFilter::LastMonth => "Last 1 month",
        }
    }

    /// Whether this selection constrains records at all
    pub fn is_bounded(&self) -> bool {
        !matches!(self, DateFilter::All)
    }
}

impl FromStr for DateFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_selection(s))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resolved date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Every record is in window, with or without a timestamp
    Unbounded,
    /// Records on this calendar day (viewer's timezone) are in window
    SameDay(NaiveDate),
    /// Records at or after this instant are in window
    Since(DateTime<Utc>),
}

impl TimeWindow {
    /// Resolve a selection against a reference instant
    pub fn resolve(filter: DateFilter, now: DateTime<Utc>, tz: &Tz) -> Self {
        match filter {
            DateFilter::All => TimeWindow::Unbounded,
            DateFilter::Today => TimeWindow::SameDay(now.with_timezone(tz).date_naive()),
            DateFilter::LastDay => TimeWindow::Since(days_before(now, 1, tz)),
            DateFilter::Last3Days => TimeWindow::Since(days_before(now, 3, tz)),
            DateFilter::LastWeek => TimeWindow::Since(days_before(now, 7, tz)),
            DateFilter::Last15Days => TimeWindow::Since(days_before(now, 15, tz)),
            DateFilter::LastMonth => TimeWindow::Since(months_before(now, 1, tz)),
        }
    }

    /// Whether an instant falls inside this window
    pub fn contains(&self, instant: &DateTime<Utc>, tz: &Tz) -> bool {
        match self {
            TimeWindow::Unbounded => true,
            TimeWindow::SameDay(day) => DailyDate::from_instant(instant, tz).inner() == day,
            TimeWindow::Since(cutoff) => instant >= cutoff,
        }
    }

    /// Whether the window constrains records
    pub fn is_bounded(&self) -> bool {
        !matches!(self, TimeWindow::Unbounded)
    }
}

/// Same wall-clock time `n` calendar days earlier
///
/// Falls back to UTC arithmetic when that wall-clock time is skipped or
/// repeated by a daylight-saving transition.
fn days_before(now: DateTime<Utc>, n: u64, tz: &Tz) -> DateTime<Utc> {
    now.with_timezone(tz)
        .checked_sub_days(Days::new(n))
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| now.checked_sub_days(Days::new(n)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Same wall-clock time `n` calendar months earlier, clamped to month end
fn months_before(now: DateTime<Utc>, n: u32, tz: &Tz) -> DateTime<Utc> {
    now.with_timezone(tz)
        .checked_sub_months(Months::new(n))
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| now.checked_sub_months(Months::new(n)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
