//! Viewer timezone handling
//!
//! Daily buckets, the "today" window and calendar arithmetic for rolling
//! cutoffs all happen in the viewer's timezone. This module resolves that
//! zone from CLI flags, the `TZ` variable or the operating system.

use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Timezone the dashboard renders and buckets dates in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneConfig {
    /// The timezone to use for date operations
    pub tz: Tz,
    /// Whether the timezone is UTC
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self::fixed(get_local_timezone())
    }
}

impl TimezoneConfig {
    /// Use an explicit timezone
    pub fn fixed(tz: Tz) -> Self {
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }

    /// Create a timezone configuration from CLI arguments
    ///
    /// `--utc` wins over `--timezone`; with neither, the local zone is detected.
    pub fn from_cli(timezone_str: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self::fixed(Tz::UTC));
        }

        match timezone_str {
            Some(tz_str) => {
                let tz = Tz::from_str(tz_str).map_err(|_| {
                    DashboardError::InvalidTimezone(format!(
                        "'{tz_str}'. Use format like 'Europe/London', 'Asia/Kolkata', or 'UTC'"
                    ))
                })?;
                Ok(Self::fixed(tz))
            }
            None => Ok(Self::default()),
        }
    }

    /// Get the display name for the configured timezone
    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }
}

/// Detect the system's local timezone
///
/// Checks `TZ` first, then asks the operating system. Falls back to UTC.
pub fn get_local_timezone() -> Tz {
    if let Ok(tz_str) = std::env::var("TZ")
        && let Ok(tz) = Tz::from_str(&tz_str)
    {
        debug!("Using timezone from TZ environment variable: {}", tz_str);
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(tz_str) => match Tz::from_str(&tz_str) {
            Ok(tz) => {
                debug!("Using system timezone: {}", tz_str);
                tz
            }
            Err(_) => {
                debug!("Unrecognized system timezone '{}', falling back to UTC", tz_str);
                Tz::UTC
            }
        },
        Err(e) => {
            debug!("Could not detect local timezone: {:?}, falling back to UTC", e);
            Tz::UTC
        }
    }
}
