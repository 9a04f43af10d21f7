//! RRULE expansion for recurring events.
//!
//! Expands a master event into concrete instances that overlap a range.
//! DTSTART is written in the event's source zone so that a weekly 19:00 date
//! night stays at 19:00 wall-clock time across DST changes.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::{DuetError, DuetResult};
use crate::event::{RejectedEvent, TimelineEvent};
use crate::timezone::{parse_tz, to_zone};

/// Upper bound on instances generated per master event.
pub const MAX_INSTANCES: u16 = 1000;

/// Build an iCalendar-format rule set string for the rrule crate parser.
fn build_rrule_string(master: &TimelineEvent) -> DuetResult<String> {
    let rule = master
        .recurrence
        .as_ref()
        .ok_or_else(|| DuetError::Recurrence(format!("event '{}' is not recurring", master.id)))?;

    let mut lines = Vec::new();

    let dtstart = match &master.source_timezone {
        Some(tzid) if !master.all_day => {
            let tz = parse_tz(tzid)?;
            format!(
                "DTSTART;TZID={}:{}",
                tz.name(),
                to_zone(master.start, tz).format("%Y%m%dT%H%M%S")
            )
        }
        _ => format!("DTSTART:{}", master.start.format("%Y%m%dT%H%M%SZ")),
    };
    lines.push(dtstart);

    let rrule = rule.rrule.trim();
    lines.push(format!(
        "RRULE:{}",
        rrule.strip_prefix("RRULE:").unwrap_or(rrule)
    ));

    for exdate in &rule.exdates {
        lines.push(format!("EXDATE:{}", exdate.format("%Y%m%dT%H%M%SZ")));
    }

    Ok(lines.join("\n"))
}

/// Expand one recurring master into the instances overlapping `[from, to)`.
///
/// Instances are plain (non-recurring) events with id `<master>@<start>`.
pub fn expand_event(
    master: &TimelineEvent,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DuetResult<Vec<TimelineEvent>> {
    master.validate()?;
    let rrule_str = build_rrule_string(master)?;

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        DuetError::Recurrence(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.id, e
        ))
    })?;

    let duration = master.duration();

    // An instance overlaps [from, to) if it starts before `to` and ends after
    // `from`, so look back by one duration. after/before are exclusive.
    let tz: rrule::Tz = Utc.into();
    let after = (from - duration - Duration::seconds(1)).with_timezone(&tz);
    let before = to.with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_INSTANCES);
    if result.limited {
        warn!(
            event = %master.id,
            limit = MAX_INSTANCES,
            "recurrence expansion truncated"
        );
    }

    let instances: Vec<TimelineEvent> = result
        .dates
        .iter()
        .map(|occ| occ.with_timezone(&Utc))
        .filter(|start| *start < to)
        .filter(|start| *start + duration > from || (duration.is_zero() && *start >= from))
        .map(|start| {
            let mut instance = master.clone();
            instance.id = format!("{}@{}", master.id, start.to_rfc3339());
            instance.start = start;
            instance.end = start + duration;
            instance.recurrence = None;
            instance
        })
        .collect();

    debug!(event = %master.id, instances = instances.len(), "expanded recurrence");
    Ok(instances)
}

/// Replace every recurring master in `events` with its instances in range.
///
/// Non-recurring events pass through untouched. Masters whose rule cannot be
/// expanded are reported as rejected.
pub fn expand_all(
    events: &[TimelineEvent],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> (Vec<TimelineEvent>, Vec<RejectedEvent>) {
    let mut expanded = Vec::with_capacity(events.len());
    let mut rejected = Vec::new();

    for event in events {
        if !event.is_recurring() {
            expanded.push(event.clone());
            continue;
        }

        match expand_event(event, from, to) {
            Ok(instances) => expanded.extend(instances),
            Err(err) => {
                warn!(event = %event.id, error = %err, "could not expand recurring event");
                rejected.push(RejectedEvent::new(&event.id, &err));
            }
        }
    }

    (expanded, rejected)
}
