//! ICS parsing using the icalendar crate's parser.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::debug;

use crate::error::{DuetError, DuetResult};
use crate::event::{
    EventCategory, EventPriority, EventType, NotificationSettings, Owner, Recurrence,
    TimelineEvent,
};
use crate::timezone::{from_local, parse_tz};

/// A DTSTART/DTEND value resolved to an instant.
struct ResolvedTime {
    instant: DateTime<Utc>,
    tzid: Option<String>,
    all_day: bool,
}

/// Parse every VEVENT in `content`.
///
/// Floating times (no TZID, no `Z`) are read in `floating_zone`. Instance
/// overrides (RECURRENCE-ID) become standalone events and their original
/// start is added to the master's exception dates.
pub fn parse_events(content: &str, floating_zone: Tz) -> DuetResult<Vec<TimelineEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| DuetError::IcsParse(e.to_string()))?;

    let mut events = Vec::new();
    let mut overridden: HashMap<String, Vec<DateTime<Utc>>> = HashMap::new();

    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        let mut event = parse_vevent(vevent, floating_zone)?;

        if let Some(prop) = vevent.find_prop("RECURRENCE-ID") {
            let original = resolve(prop, floating_zone)?.instant;
            overridden.entry(event.id.clone()).or_default().push(original);
            event.id = format!("{}@{}", event.id, original.to_rfc3339());
            event.recurrence = None;
        }

        events.push(event);
    }

    for event in events.iter_mut() {
        if let (Some(rule), Some(originals)) = (event.recurrence.as_mut(), overridden.get(&event.id)) {
            rule.exdates.extend(originals.iter().copied());
        }
    }

    debug!(events = events.len(), "parsed ics content");
    Ok(events)
}

fn parse_vevent(vevent: &Component, floating_zone: Tz) -> DuetResult<TimelineEvent> {
    let id = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .ok_or_else(|| DuetError::IcsParse("VEVENT without UID".into()))?;
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| DuetError::IcsParse(format!("event '{id}' has no DTSTART")))?;
    let start = resolve(start_prop, floating_zone)?;

    let end = match vevent.find_prop("DTEND") {
        Some(prop) => resolve(prop, floating_zone)?.instant,
        None => start.instant + default_length(vevent, start.all_day)?,
    };

    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());

    let category = vevent
        .find_prop("CATEGORIES")
        .and_then(|p| {
            let labels: &str = p.val.as_ref();
            labels.split(',').find_map(EventCategory::from_label)
        })
        .unwrap_or_default();

    let priority = vevent
        .find_prop("PRIORITY")
        .and_then(|p| {
            let raw: &str = p.val.as_ref();
            raw.trim().parse::<u8>().ok()
        })
        .map(EventPriority::from_ics)
        .unwrap_or_default();

    let event_type = vevent
        .find_prop("X-DUET-TYPE")
        .and_then(|p| event_type_from_label(p.val.as_ref()))
        .unwrap_or_default();

    let owner = match vevent.find_prop("X-DUET-OWNER") {
        Some(p) if str::eq_ignore_ascii_case(p.val.as_ref(), "partner") => Owner::Partner,
        _ => Owner::User,
    };

    // Recurrence (RRULE, EXDATE)
    let recurrence = match vevent.find_prop("RRULE") {
        Some(prop) => {
            let mut exdates = Vec::new();
            for exdate in vevent.properties.iter().filter(|p| p.name == "EXDATE") {
                exdates.extend(parse_exdate_property(exdate, floating_zone)?);
            }
            Some(Recurrence {
                rrule: prop.val.to_string(),
                exdates,
            })
        }
        None => None,
    };

    // Reminders from VALARM components
    let minutes_before: Vec<i64> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| parse_trigger_minutes(alarm.find_prop("TRIGGER")?.val.as_ref()))
        .collect();

    Ok(TimelineEvent {
        id,
        title,
        description,
        location,
        start: start.instant,
        end,
        source_timezone: start.tzid,
        all_day: start.all_day,
        event_type,
        category,
        priority,
        recurrence,
        notifications: NotificationSettings {
            enabled: !minutes_before.is_empty(),
            minutes_before,
        },
        owner,
    })
}

fn resolve(prop: &Property, floating_zone: Tz) -> DuetResult<ResolvedTime> {
    let value = DatePerhapsTime::try_from(prop).map_err(|e| {
        let name: &str = prop.name.as_ref();
        let raw: &str = prop.val.as_ref();
        DuetError::IcsParse(format!("invalid {name} value '{raw}': {e:?}"))
    })?;

    match value {
        DatePerhapsTime::Date(d) => Ok(ResolvedTime {
            instant: date_instant(d),
            tzid: None,
            all_day: true,
        }),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Ok(ResolvedTime {
            instant: dt,
            tzid: None,
            all_day: false,
        }),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Ok(ResolvedTime {
            instant: from_local(naive, floating_zone)?,
            tzid: None,
            all_day: false,
        }),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz = parse_tz(&tzid)?;
            Ok(ResolvedTime {
                instant: from_local(date_time, tz)?,
                tzid: Some(tz.name().to_string()),
                all_day: false,
            })
        }
    }
}

fn date_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Length used when DTEND is absent: DURATION if given, else one day for
/// all-day events and zero for timed ones.
fn default_length(vevent: &Component, all_day: bool) -> DuetResult<Duration> {
    if let Some(prop) = vevent.find_prop("DURATION") {
        let raw: &str = prop.val.as_ref();
        let parsed = iso8601::duration(raw)
            .map_err(|e| DuetError::IcsParse(format!("invalid DURATION '{raw}': {e}")))?;
        let std_duration: std::time::Duration = parsed.into();
        return Duration::from_std(std_duration)
            .map_err(|e| DuetError::IcsParse(format!("DURATION out of range: {e}")));
    }
    Ok(if all_day {
        Duration::days(1)
    } else {
        Duration::zero()
    })
}

fn event_type_from_label(label: &str) -> Option<EventType> {
    match label.trim().to_ascii_lowercase().as_str() {
        "date" => Some(EventType::Date),
        "anniversary" => Some(EventType::Anniversary),
        "meeting" => Some(EventType::Meeting),
        "reminder" => Some(EventType::Reminder),
        "task" => Some(EventType::Task),
        "other" => Some(EventType::Other),
        _ => None,
    }
}

/// Parse an EXDATE property into instants.
///
/// Handles TZID and VALUE=DATE parameters, UTC and floating values, and
/// comma-separated lists.
fn parse_exdate_property(prop: &Property, floating_zone: Tz) -> DuetResult<Vec<DateTime<Utc>>> {
    let tz = match prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref())
    {
        Some(tzid) => Some(parse_tz(tzid.as_ref())?),
        None => None,
    };

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    let mut instants = Vec::new();
    let values: &str = prop.val.as_ref();
    for s in values.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let invalid = || DuetError::IcsParse(format!("invalid EXDATE value '{s}'"));

        let instant = if is_date {
            date_instant(NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| invalid())?)
        } else if let Some(utc) = s.strip_suffix('Z') {
            NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                .map_err(|_| invalid())?
                .and_utc()
        } else {
            let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
            from_local(naive, tz.unwrap_or(floating_zone))?
        };
        instants.push(instant);
    }

    Ok(instants)
}

/// Parse TRIGGER value to minutes before event (-PT30M, -P1D, etc.)
fn parse_trigger_minutes(value: &str) -> Option<i64> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Some(if is_before { minutes } else { -minutes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CALENDAR: &str = "BEGIN:VCALENDAR
VERSION:2.0
PRODID:-//duet//test//EN
BEGIN:VEVENT
UID:dinner-1
SUMMARY:Anniversary dinner
LOCATION:Trattoria
DTSTART;TZID=Europe/Berlin:20250320T193000
DTEND;TZID=Europe/Berlin:20250320T220000
CATEGORIES:Shared,Food
PRIORITY:2
X-DUET-TYPE:anniversary
X-DUET-OWNER:partner
BEGIN:VALARM
ACTION:DISPLAY
TRIGGER:-PT30M
END:VALARM
END:VEVENT
BEGIN:VEVENT
UID:holiday-1
SUMMARY:Long weekend
DTSTART;VALUE=DATE:20250321
DTEND;VALUE=DATE:20250324
END:VEVENT
END:VCALENDAR
";

    const RECURRING: &str = "BEGIN:VCALENDAR
VERSION:2.0
PRODID:-//duet//test//EN
BEGIN:VEVENT
UID:walk
SUMMARY:Evening walk
DTSTART;TZID=Europe/Berlin:20250303T180000
DURATION:PT45M
RRULE:FREQ=WEEKLY;BYDAY=MO
EXDATE;TZID=Europe/Berlin:20250310T180000
END:VEVENT
BEGIN:VEVENT
UID:walk
RECURRENCE-ID;TZID=Europe/Berlin:20250317T180000
SUMMARY:Evening walk (late)
DTSTART;TZID=Europe/Berlin:20250317T190000
DTEND;TZID=Europe/Berlin:20250317T194500
END:VEVENT
END:VCALENDAR
";

    #[test]
    fn test_parse_zoned_event_fields() {
        let events = parse_events(CALENDAR, Tz::UTC).unwrap();
        assert_eq!(events.len(), 2);

        let dinner = &events[0];
        assert_eq!(dinner.id, "dinner-1");
        assert_eq!(dinner.title, "Anniversary dinner");
        assert_eq!(dinner.location.as_deref(), Some("Trattoria"));
        assert_eq!(dinner.source_timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(dinner.start, Utc.with_ymd_and_hms(2025, 3, 20, 18, 30, 0).unwrap());
        assert_eq!(dinner.end, Utc.with_ymd_and_hms(2025, 3, 20, 21, 0, 0).unwrap());
        assert_eq!(dinner.category, EventCategory::Shared);
        assert_eq!(dinner.priority, EventPriority::High);
        assert_eq!(dinner.event_type, EventType::Anniversary);
        assert_eq!(dinner.owner, Owner::Partner);
        assert_eq!(dinner.notifications.minutes_before, vec![30]);
        assert!(dinner.notifications.enabled);
    }

    #[test]
    fn test_parse_all_day_event() {
        let events = parse_events(CALENDAR, Tz::UTC).unwrap();
        let holiday = &events[1];

        assert!(holiday.all_day);
        assert_eq!(holiday.start, Utc.with_ymd_and_hms(2025, 3, 21, 0, 0, 0).unwrap());
        assert_eq!(holiday.end, Utc.with_ymd_and_hms(2025, 3, 24, 0, 0, 0).unwrap());
        assert!(holiday.source_timezone.is_none());
        assert!(!holiday.notifications.enabled);
    }

    #[test]
    fn test_parse_recurrence_duration_and_override() {
        let events = parse_events(RECURRING, Tz::UTC).unwrap();
        assert_eq!(events.len(), 2);

        let master = &events[0];
        assert_eq!(master.duration(), Duration::minutes(45));
        let rule = master.recurrence.as_ref().unwrap();
        assert_eq!(rule.rrule, "FREQ=WEEKLY;BYDAY=MO");
        assert_eq!(
            rule.exdates,
            vec![
                Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 17, 17, 0, 0).unwrap(),
            ]
        );

        let moved = &events[1];
        assert!(moved.id.starts_with("walk@2025-03-17T17:00:00"));
        assert!(moved.recurrence.is_none());
        assert_eq!(moved.start, Utc.with_ymd_and_hms(2025, 3, 17, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_floating_time_uses_given_zone() {
        let ics = "BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:floating
SUMMARY:Breakfast
DTSTART:20250320T080000
DTEND:20250320T090000
END:VEVENT
END:VCALENDAR
";
        let tokyo = parse_tz("Asia/Tokyo").unwrap();
        let events = parse_events(ics, tokyo).unwrap();
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 3, 19, 23, 0, 0).unwrap());
        assert!(events[0].source_timezone.is_none());
    }

    #[test]
    fn test_missing_dtstart_is_an_error() {
        let ics = "BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:broken
SUMMARY:No start
END:VEVENT
END:VCALENDAR
";
        assert!(matches!(parse_events(ics, Tz::UTC), Err(DuetError::IcsParse(_))));
    }

    #[test]
    fn test_trigger_minutes() {
        assert_eq!(parse_trigger_minutes("-PT15M"), Some(15));
        assert_eq!(parse_trigger_minutes("-P1D"), Some(1440));
        assert_eq!(parse_trigger_minutes("PT5M"), Some(-5));
    }
}
