//! Day, week, and month timeline views.
//!
//! Every view runs the same pass: expand recurrences for the visible range,
//! bucket into per-day slots, group each day into overlap clusters, and lay
//! the clusters out.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bucket::{AllDayEntry, Buckets, DayBucket, bucket_events};
use crate::error::{DuetError, DuetResult};
use crate::event::{RejectedEvent, TimelineEvent};
use crate::layout::{ClusterLayout, LayoutConfig, layout_cluster};
use crate::overlap::{GroupingStrategy, group};
use crate::recurrence::expand_all;
use crate::timezone::{DisplayZone, TimezonePolicy, start_of_day};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }

    /// First day of the week containing `date`.
    pub fn week_of(self, date: NaiveDate) -> NaiveDate {
        date.week(self.weekday()).first_day()
    }
}

/// Everything a layout pass needs besides the events themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineOptions {
    pub zones: DisplayZone,
    pub grouping: GroupingStrategy,
    pub layout: LayoutConfig,
    pub week_start: WeekStart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub all_day: Vec<AllDayEntry>,
    pub clusters: Vec<ClusterLayout>,
}

impl DayLayout {
    pub fn event_count(&self) -> usize {
        self.clusters.iter().map(ClusterLayout::len).sum::<usize>() + self.all_day.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    /// Viewer zone; under [`TimezonePolicy::Source`] only the fallback
    pub zone: String,
    pub policy: TimezonePolicy,
    pub days: Vec<DayLayout>,
    pub rejected: Vec<RejectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCell {
    pub date: NaiveDate,
    /// False for the leading/trailing days of neighbouring months
    pub in_month: bool,
    pub titles: Vec<String>,
    pub overflow: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Six rows of seven cells
    pub weeks: Vec<Vec<MonthCell>>,
    pub rejected: Vec<RejectedEvent>,
}

pub fn day_view(
    events: &[TimelineEvent],
    date: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<TimelineView> {
    timeline_view(events, date, date, options)
}

pub fn week_view(
    events: &[TimelineEvent],
    date: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<TimelineView> {
    let first = options.week_start.week_of(date);
    timeline_view(events, first, first + Duration::days(6), options)
}

/// Lay out every date in `first..=last`.
pub fn timeline_view(
    events: &[TimelineEvent],
    first: NaiveDate,
    last: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<TimelineView> {
    let buckets = prepare(events, first, last, options)?;

    let days = buckets
        .days
        .iter()
        .map(|(date, bucket)| layout_day(*date, bucket, options))
        .collect();

    Ok(TimelineView {
        zone: options.zones.viewer.name().to_string(),
        policy: options.zones.policy,
        days,
        rejected: buckets.rejected,
    })
}

/// Month grid of 6×7 dates starting on the configured week start.
pub fn month_view(
    events: &[TimelineEvent],
    year: i32,
    month: u32,
    options: &TimelineOptions,
) -> DuetResult<MonthView> {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DuetError::Config(format!("invalid month {year}-{month:02}")))?;
    let grid_start = options.week_start.week_of(first_of_month);
    let grid_end = grid_start + Duration::days(41);

    let buckets = prepare(events, grid_start, grid_end, options)?;
    let cap = options.layout.max_columns;

    let cells: Vec<MonthCell> = buckets
        .days
        .iter()
        .map(|(date, bucket)| {
            let mut titles: Vec<String> = bucket.all_day.iter().map(|e| e.title.clone()).collect();
            titles.extend(bucket.placements().into_iter().map(|p| p.title));

            let overflow = titles.len().saturating_sub(cap);
            titles.truncate(cap);

            MonthCell {
                date: *date,
                in_month: date.month() == month,
                titles,
                overflow,
            }
        })
        .collect();

    let weeks = cells.chunks(7).map(<[MonthCell]>::to_vec).collect();

    Ok(MonthView {
        year,
        month,
        weeks,
        rejected: buckets.rejected,
    })
}

/// Expand recurrences and bucket events for `first..=last`.
pub(crate) fn prepare(
    events: &[TimelineEvent],
    first: NaiveDate,
    last: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<Buckets> {
    options.layout.validate()?;
    if last < first {
        return Err(DuetError::Config(format!(
            "range ends before it starts ({first} > {last})"
        )));
    }

    let (from, to) = expansion_window(first, last, options)?;
    let (expanded, mut rejected) = expand_all(events, from, to);

    let mut buckets = bucket_events(
        &expanded,
        first,
        last,
        &options.zones,
        options.layout.slot_minutes,
    );
    rejected.append(&mut buckets.rejected);
    buckets.rejected = rejected;

    debug!(%first, %last, events = expanded.len(), "prepared timeline range");
    Ok(buckets)
}

/// Instants covering the range in any zone an event may be shown in.
///
/// UTC offsets span -12:00 to +14:00, so a source zone's day can sit more
/// than a day away from the viewer's. The window is widened by two days on
/// each side; bucketing clips to the real range.
fn expansion_window(
    first: NaiveDate,
    last: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<(DateTime<Utc>, DateTime<Utc>)> {
    let viewer = options.zones.viewer;
    let from = start_of_day(first, viewer)? - Duration::days(2);
    let to = start_of_day(last + Duration::days(1), viewer)? + Duration::days(2);
    Ok((from, to))
}

fn layout_day(date: NaiveDate, bucket: &DayBucket, options: &TimelineOptions) -> DayLayout {
    let placements = bucket.placements();

    let clusters = group(&placements, options.grouping)
        .iter()
        .map(|cluster| layout_cluster(cluster, &options.layout))
        .collect();

    DayLayout {
        date,
        all_day: bucket.all_day.clone(),
        clusters,
    }
}
