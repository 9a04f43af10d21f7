//! Display-zone selection and instant/wall-clock conversion.
//!
//! A layout pass renders every event in exactly one zone chosen by a single
//! [`TimezonePolicy`]. Conversions never fall back to "now": a bad zone or a
//! wall-clock time inside a DST gap is reported as an error.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DuetError, DuetResult};
use crate::event::TimelineEvent;

/// Which zone events are rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezonePolicy {
    /// Everything renders in the viewer's zone
    #[default]
    Viewer,
    /// Each event renders in its stamped source zone, else the viewer's
    Source,
}

/// Resolves the display zone for each event under one policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayZone {
    pub policy: TimezonePolicy,
    pub viewer: Tz,
}

impl DisplayZone {
    pub fn new(policy: TimezonePolicy, viewer: Tz) -> Self {
        DisplayZone { policy, viewer }
    }

    pub fn zone_for(&self, event: &TimelineEvent) -> DuetResult<Tz> {
        match (self.policy, &event.source_timezone) {
            (TimezonePolicy::Source, Some(tzid)) => parse_tz(tzid),
            _ => Ok(self.viewer),
        }
    }
}

pub fn parse_tz(name: &str) -> DuetResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DuetError::UnknownTimezone(name.to_string()))
}

/// The host's zone, or UTC when it cannot be determined.
pub fn system_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => parse_tz(&name).unwrap_or_else(|_| {
            debug!(zone = %name, "system timezone not in tz database, using UTC");
            Tz::UTC
        }),
        Err(err) => {
            debug!(error = %err, "could not read system timezone, using UTC");
            Tz::UTC
        }
    }
}

pub fn to_zone(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Convert a wall-clock time in `tz` back to an instant.
///
/// Ambiguous times (DST fold) resolve to the earlier instant. Times inside a
/// DST gap do not exist and are an error.
pub fn from_local(local: NaiveDateTime, tz: Tz) -> DuetResult<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(DuetError::NonexistentLocalTime {
            datetime: local,
            tz: tz.name().to_string(),
        }),
    }
}

/// First instant of `date` in `tz`.
///
/// Zones that switch DST at midnight have no 00:00 on that date; the day
/// then starts at the first wall-clock minute that exists.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DuetResult<DateTime<Utc>> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    for minutes in 0..=180 {
        let candidate = midnight + Duration::minutes(minutes);
        if let Ok(instant) = from_local(candidate, tz) {
            return Ok(instant);
        }
    }
    Err(DuetError::NonexistentLocalTime {
        datetime: midnight,
        tz: tz.name().to_string(),
    })
}

/// Wall-clock minutes since local midnight.
pub fn minute_of_day<Z: TimeZone>(local: &DateTime<Z>) -> u32 {
    local.hour() * 60 + local.minute()
}
