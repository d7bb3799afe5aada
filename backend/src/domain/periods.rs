//! Class-period resolution.
//!
//! Periods are configured as `HH:MM` strings and compared lexicographically,
//! which is exact for zero-padded 24-hour times. Start is inclusive, end is
//! exclusive, and the first matching window in list order wins.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One configured class-time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPeriod {
    pub number: u8,
    pub start: String,
    pub end: String,
}

impl ClassPeriod {
    pub fn new(number: u8, start: &str, end: &str) -> Self {
        Self {
            number,
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// The roster's period filter: everything, or one period only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourFilter {
    All,
    Period(u8),
}

impl HourFilter {
    /// Whether a record with the given period passes this filter.
    pub fn matches(&self, period: Option<u8>) -> bool {
        match self {
            HourFilter::All => true,
            HourFilter::Period(n) => period == Some(*n),
        }
    }
}

impl fmt::Display for HourFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HourFilter::All => write!(f, "all"),
            HourFilter::Period(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for HourFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(HourFilter::All);
        }
        s.parse::<u8>()
            .map(HourFilter::Period)
            .map_err(|_| format!("invalid filter value: {}", s))
    }
}

/// Map a wall-clock time to the class period it falls in, if any.
pub fn resolve_period(periods: &[ClassPeriod], t: NaiveTime) -> Option<u8> {
    let hhmm = t.format("%H:%M").to_string();
    periods
        .iter()
        .find(|p| p.start.as_str() <= hhmm.as_str() && hhmm.as_str() < p.end.as_str())
        .map(|p| p.number)
}

/// The filter the display should show for the given time: the current
/// period when one is in session, otherwise everything.
pub fn filter_for(periods: &[ClassPeriod], t: NaiveTime) -> HourFilter {
    match resolve_period(periods, t) {
        Some(n) => HourFilter::Period(n),
        None => HourFilter::All,
    }
}
