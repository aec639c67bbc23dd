//! Resolves a participant's naive 12-hour date/time input to an
//! absolute instant, using the static per-participant timezone table
//! from configuration.

use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("No timezone assignment for {0}")]
    UnknownTimezone(String),
    #[error("Invalid event date: {0}")]
    InvalidDate(String),
    #[error("Invalid clock value: {0}")]
    InvalidClock(String),
    #[error("Local time {0} does not exist in {1}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl FromStr for Meridiem {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            other => Err(TimeError::InvalidClock(other.to_string())),
        }
    }
}

/// Static zone-name → member-identities mapping, built once from
/// configuration and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TimezoneTable {
    groups: Vec<(Tz, Vec<String>)>,
}

impl TimezoneTable {
    pub fn new(groups: Vec<(Tz, Vec<String>)>) -> Self {
        Self { groups }
    }

    /// Exact-match membership lookup across the configured groups.
    pub fn zone_for(&self, identity: &str) -> Option<Tz> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == identity))
            .map(|(zone, _)| *zone)
    }

    pub fn groups(&self) -> impl Iterator<Item = (Tz, &[String])> {
        self.groups
            .iter()
            .map(|(zone, members)| (*zone, members.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstant {
    pub local: DateTime<Tz>,
    pub utc: DateTime<Utc>,
}

pub struct TimeResolver {
    table: TimezoneTable,
    year: i32,
}

impl TimeResolver {
    /// Events carry no year in their date input; the resolver pins one
    /// at construction (callers pass the current year).
    pub fn new(table: TimezoneTable, year: i32) -> Self {
        Self { table, year }
    }

    /// Maps `identity` + `"M-d"` date + 12-hour clock to local and UTC
    /// instants, applying the zone's daylight-saving rule for that
    /// date. An ambiguous local time (fall-back hour) resolves to the
    /// earlier, DST-side instant.
    pub fn resolve(
        &self,
        identity: &str,
        month_day: &str,
        hour12: u32,
        minute: u32,
        meridiem: Meridiem,
    ) -> Result<ResolvedInstant, TimeError> {
        let zone = self
            .table
            .zone_for(identity)
            .ok_or_else(|| TimeError::UnknownTimezone(identity.to_string()))?;

        let hour = to_24_hour(hour12, meridiem)?;
        if minute > 59 {
            return Err(TimeError::InvalidClock(minute.to_string()));
        }

        let date = self.parse_month_day(month_day)?;
        let naive = date
            .and_hms_opt(hour, minute, 0)
            .ok_or_else(|| TimeError::InvalidClock(format!("{hour}:{minute}")))?;

        let local = match zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => return Err(TimeError::NonexistentLocalTime(naive, zone)),
        };

        Ok(ResolvedInstant {
            utc: local.with_timezone(&Utc),
            local,
        })
    }

    fn parse_month_day(&self, month_day: &str) -> Result<NaiveDate, TimeError> {
        let invalid = || TimeError::InvalidDate(month_day.to_string());
        let (month, day) = month_day.split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(self.year, month, day).ok_or_else(invalid)
    }
}

fn to_24_hour(hour12: u32, meridiem: Meridiem) -> Result<u32, TimeError> {
    if !(1..=12).contains(&hour12) {
        return Err(TimeError::InvalidClock(hour12.to_string()));
    }
    Ok(match (hour12, meridiem) {
        (12, Meridiem::Am) => 0,
        (12, Meridiem::Pm) => 12,
        (h, Meridiem::Am) => h,
        (h, Meridiem::Pm) => h + 12,
    })
}
