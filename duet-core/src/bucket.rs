//! Partition events into per-day, per-slot buckets.
//!
//! Each timed event is converted into its display zone and clipped into one
//! [`Placement`] per local date it touches. A placement lands in the slot
//! that contains its (clipped) start minute.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::DuetResult;
use crate::event::{Owner, RejectedEvent, TimelineEvent};
use crate::overlap::Interval;
use crate::timezone::{DisplayZone, minute_of_day, start_of_day, to_zone};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// The part of one event that falls on one local date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub event_id: String,
    pub title: String,
    pub owner: Owner,
    pub date: NaiveDate,
    /// Display zone name
    pub zone: String,
    /// Wall-clock minute the segment starts at
    pub start_minute: u32,
    /// Exclusive, at most [`MINUTES_PER_DAY`]
    pub end_minute: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The event started on an earlier date
    pub continues_before: bool,
    /// The event carries on past this date
    pub continues_after: bool,
}

impl Placement {
    pub fn slot(&self, slot_minutes: u32) -> u16 {
        (self.start_minute / slot_minutes) as u16
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute.saturating_sub(self.start_minute)
    }
}

impl Interval for Placement {
    fn start_key(&self) -> i64 {
        i64::from(self.start_minute)
    }

    fn end_key(&self) -> i64 {
        i64::from(self.end_minute.max(self.start_minute + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllDayEntry {
    pub event_id: String,
    pub title: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayBucket {
    /// Slot index to the placements starting in that slot
    pub slots: BTreeMap<u16, Vec<Placement>>,
    pub all_day: Vec<AllDayEntry>,
}

impl DayBucket {
    /// All placements of the day ordered by start minute, then end, then id.
    pub fn placements(&self) -> Vec<Placement> {
        let mut all: Vec<Placement> = self.slots.values().flatten().cloned().collect();
        sort_placements(&mut all);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.all_day.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Buckets {
    pub slot_minutes: u32,
    /// One entry per date in the requested range, even when empty
    pub days: BTreeMap<NaiveDate, DayBucket>,
    pub rejected: Vec<RejectedEvent>,
}

impl Buckets {
    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.days.get(&date)
    }
}

/// Bucket `events` for every date in `first..=last`.
///
/// Events that fail validation or whose zone cannot be resolved are
/// reported in [`Buckets::rejected`] instead of being placed.
pub fn bucket_events(
    events: &[TimelineEvent],
    first: NaiveDate,
    last: NaiveDate,
    zones: &DisplayZone,
    slot_minutes: u32,
) -> Buckets {
    let mut days: BTreeMap<NaiveDate, DayBucket> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| (d, DayBucket::default()))
        .collect();
    let mut rejected = Vec::new();

    for event in events {
        let placed = if event.all_day {
            event.validate().map(|_| place_all_day(event, &mut days))
        } else {
            place_timed(event, zones, slot_minutes, &mut days)
        };

        if let Err(err) = placed {
            warn!(event = %event.id, error = %err, "event rejected from timeline");
            rejected.push(RejectedEvent::new(&event.id, &err));
        }
    }

    debug!(
        days = days.len(),
        events = events.len(),
        rejected = rejected.len(),
        "bucketed events"
    );

    Buckets {
        slot_minutes,
        days,
        rejected,
    }
}

fn place_all_day(event: &TimelineEvent, days: &mut BTreeMap<NaiveDate, DayBucket>) {
    let first = event.start.date_naive();
    // End date is exclusive; a zero-length all-day event still covers its start date
    let last = (event.end.date_naive() - Duration::days(1)).max(first);

    for (_, bucket) in days.range_mut(first..=last) {
        bucket.all_day.push(AllDayEntry {
            event_id: event.id.clone(),
            title: event.title.clone(),
            owner: event.owner,
        });
    }
}

fn place_timed(
    event: &TimelineEvent,
    zones: &DisplayZone,
    slot_minutes: u32,
    days: &mut BTreeMap<NaiveDate, DayBucket>,
) -> DuetResult<()> {
    event.validate()?;
    let tz = zones.zone_for(event)?;

    let first_date = to_zone(event.start, tz).date_naive();
    let last_date = if event.end > event.start {
        to_zone(event.end - Duration::nanoseconds(1), tz).date_naive()
    } else {
        first_date
    };

    let (Some(range_first), Some(range_last)) = (
        days.keys().next().copied(),
        days.keys().next_back().copied(),
    ) else {
        return Ok(());
    };

    let from = first_date.max(range_first);
    let to = last_date.min(range_last);
    if from > to {
        return Ok(());
    }

    for date in from.iter_days().take_while(|d| *d <= to) {
        let day_start = start_of_day(date, tz)?;
        let day_end = start_of_day(date + Duration::days(1), tz)?;

        let seg_start = event.start.max(day_start);
        let seg_end = event.end.min(day_end);

        // Both ends are wall-clock minutes so DST days keep one scale
        let start_minute = minute_of_day(&to_zone(seg_start, tz));
        let end_minute = if seg_end >= day_end {
            MINUTES_PER_DAY
        } else {
            minute_of_day(&to_zone(seg_end, tz)).max(start_minute)
        };

        let placement = Placement {
            event_id: event.id.clone(),
            title: event.title.clone(),
            owner: event.owner,
            date,
            zone: tz.name().to_string(),
            start_minute,
            end_minute,
            start: seg_start,
            end: seg_end,
            continues_before: event.start < day_start,
            continues_after: event.end > day_end,
        };

        let slot = placement.slot(slot_minutes);
        if let Some(bucket) = days.get_mut(&date) {
            bucket.slots.entry(slot).or_default().push(placement);
        }
    }

    Ok(())
}

pub(crate) fn sort_placements(placements: &mut [Placement]) {
    placements.sort_by(|a, b| {
        a.start_minute
            .cmp(&b.start_minute)
            .then(b.end_minute.cmp(&a.end_minute))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::{GroupingStrategy, group};
    use crate::timezone::{TimezonePolicy, parse_tz};
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, h, m, 0).unwrap()
    }

    fn viewer_utc() -> DisplayZone {
        DisplayZone::new(TimezonePolicy::Viewer, Tz::UTC)
    }

    #[test]
    fn test_event_lands_in_half_hour_slot_of_its_start() {
        let events = vec![TimelineEvent::new("a", "Coffee", utc(20, 9, 45), utc(20, 10, 15))];
        let buckets = bucket_events(&events, date(20), date(20), &viewer_utc(), 30);

        let day = buckets.day(date(20)).unwrap();
        // 09:45 falls in slot 19 (09:30-10:00)
        assert_eq!(day.slots.keys().copied().collect::<Vec<_>>(), vec![19]);
        let p = &day.slots[&19][0];
        assert_eq!(p.start_minute, 9 * 60 + 45);
        assert_eq!(p.end_minute, 10 * 60 + 15);
    }

    #[test]
    fn test_event_crossing_midnight_is_split_per_day() {
        let events = vec![TimelineEvent::new("a", "Night out", utc(20, 22, 0), utc(21, 2, 0))];
        let buckets = bucket_events(&events, date(20), date(21), &viewer_utc(), 30);

        let first = buckets.day(date(20)).unwrap().placements();
        let second = buckets.day(date(21)).unwrap().placements();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].start_minute, 22 * 60);
        assert_eq!(first[0].end_minute, MINUTES_PER_DAY);
        assert!(first[0].continues_after);

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].start_minute, 0);
        assert_eq!(second[0].end_minute, 120);
        assert!(second[0].continues_before);
    }

    #[test]
    fn test_viewer_zone_shifts_date() {
        // 23:30 UTC is already the next day in Tokyo
        let events = vec![TimelineEvent::new("a", "Call", utc(20, 23, 30), utc(21, 0, 0))];
        let zones = DisplayZone::new(TimezonePolicy::Viewer, parse_tz("Asia/Tokyo").unwrap());
        let buckets = bucket_events(&events, date(20), date(21), &zones, 30);

        assert!(buckets.day(date(20)).unwrap().is_empty());
        let placements = buckets.day(date(21)).unwrap().placements();
        assert_eq!(placements[0].start_minute, 8 * 60 + 30);
        assert_eq!(placements[0].zone, "Asia/Tokyo");
    }

    #[test]
    fn test_source_policy_renders_in_stamped_zone() {
        let event = TimelineEvent::new("a", "Flight", utc(20, 12, 0), utc(20, 13, 0))
            .with_source_timezone("America/New_York");
        let zones = DisplayZone::new(TimezonePolicy::Source, Tz::UTC);
        let buckets = bucket_events(&[event], date(20), date(20), &zones, 30);

        let placements = buckets.day(date(20)).unwrap().placements();
        // New York is UTC-4 after 2025-03-09
        assert_eq!(placements[0].start_minute, 8 * 60);
    }

    #[test]
    fn test_invalid_events_are_rejected_not_placed() {
        let events = vec![
            TimelineEvent::new("bad", "Backwards", utc(20, 10, 0), utc(20, 9, 0)),
            TimelineEvent::new("tz", "Lost", utc(20, 10, 0), utc(20, 11, 0))
                .with_source_timezone("Atlantis/Central"),
            TimelineEvent::new("ok", "Lunch", utc(20, 12, 0), utc(20, 13, 0)),
        ];
        let zones = DisplayZone::new(TimezonePolicy::Source, Tz::UTC);
        let buckets = bucket_events(&events, date(20), date(20), &zones, 30);

        let ids: Vec<_> = buckets.rejected.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["bad", "tz"]);
        assert_eq!(buckets.day(date(20)).unwrap().placements().len(), 1);
    }

    #[test]
    fn test_all_day_event_covers_each_date_exclusive_end() {
        let mut trip = TimelineEvent::new("trip", "Weekend away", utc(21, 0, 0), utc(23, 0, 0));
        trip.all_day = true;
        let buckets = bucket_events(&[trip], date(20), date(23), &viewer_utc(), 30);

        let covered: Vec<_> = buckets
            .days
            .iter()
            .filter(|(_, b)| !b.all_day.is_empty())
            .map(|(d, _)| *d)
            .collect();
        assert_eq!(covered, vec![date(21), date(22)]);
    }

    #[test]
    fn test_spring_forward_day_uses_wall_clock_ends() {
        let berlin = DisplayZone::new(TimezonePolicy::Viewer, parse_tz("Europe/Berlin").unwrap());
        // 01:00-04:00 and 03:30-04:30 local on the day clocks jump from 02:00 to 03:00
        let events = vec![
            TimelineEvent::new("a", "Brunch", utc(30, 0, 0), utc(30, 2, 0)),
            TimelineEvent::new("b", "Walk", utc(30, 1, 30), utc(30, 2, 30)),
        ];
        let buckets = bucket_events(&events, date(30), date(30), &berlin, 30);
        let placements = buckets.day(date(30)).unwrap().placements();

        assert_eq!((placements[0].start_minute, placements[0].end_minute), (60, 240));
        assert_eq!((placements[1].start_minute, placements[1].end_minute), (210, 270));

        let clusters = group(&placements, GroupingStrategy::Sweep);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_fall_back_day_uses_wall_clock_ends() {
        let berlin = DisplayZone::new(TimezonePolicy::Viewer, parse_tz("Europe/Berlin").unwrap());
        let day = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        let at = |h, m| Utc.with_ymd_and_hms(2025, 10, 26, h, m, 0).unwrap();
        // 01:00-04:00 local spans four real hours; the day runs to 24:00 on the wall
        let events = vec![
            TimelineEvent::new(
                "a",
                "Party",
                Utc.with_ymd_and_hms(2025, 10, 25, 23, 0, 0).unwrap(),
                at(3, 0),
            ),
            TimelineEvent::new("b", "Late", at(22, 0), at(23, 30)),
        ];
        let buckets = bucket_events(&events, day, day, &berlin, 30);
        let placements = buckets.day(day).unwrap().placements();

        assert_eq!((placements[0].start_minute, placements[0].end_minute), (60, 240));
        assert_eq!((placements[1].start_minute, placements[1].end_minute), (23 * 60, MINUTES_PER_DAY));
        assert!(placements[1].continues_after);
    }

    #[test]
    fn test_events_outside_range_are_ignored() {
        let events = vec![TimelineEvent::new("a", "Later", utc(25, 9, 0), utc(25, 10, 0))];
        let buckets = bucket_events(&events, date(20), date(21), &viewer_utc(), 30);
        assert!(buckets.days.values().all(DayBucket::is_empty));
        assert!(buckets.rejected.is_empty());
    }
}
