//! Side-by-side user/partner slots for one date.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::bucket::{MINUTES_PER_DAY, Placement};
use crate::error::DuetResult;
use crate::event::{Owner, RejectedEvent, TimelineEvent};
use crate::timeline::{TimelineOptions, prepare};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn from_minute(minute_of_day: u32) -> Self {
        TimeOfDay {
            hour: (minute_of_day / 60) as u8,
            minute: (minute_of_day % 60) as u8,
        }
    }

    pub fn minute_of_day(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualSlot {
    pub time: TimeOfDay,
    pub user: Option<String>,
    pub partner: Option<String>,
    /// User events covering the slot that lost to `user`
    pub hidden_user: usize,
    pub hidden_partner: usize,
}

impl DualSlot {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.partner.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualView {
    pub date: NaiveDate,
    pub slot_minutes: u32,
    /// Every slot of the day in order, including empty ones
    pub slots: Vec<DualSlot>,
    pub rejected: Vec<RejectedEvent>,
}

impl DualView {
    pub fn occupied(&self) -> impl Iterator<Item = &DualSlot> {
        self.slots.iter().filter(|s| !s.is_empty())
    }
}

/// Build the dual calendar for `date`, splitting events by [`Owner`].
///
/// An event fills every slot it covers. When several events of the same
/// owner cover a slot, the earliest start wins (then the lowest id) and the
/// rest are counted as hidden.
pub fn dual_view(
    events: &[TimelineEvent],
    date: NaiveDate,
    options: &TimelineOptions,
) -> DuetResult<DualView> {
    let buckets = prepare(events, date, date, options)?;
    let slot_minutes = buckets.slot_minutes;
    let placements = buckets
        .day(date)
        .map(|day| day.placements())
        .unwrap_or_default();

    let slots = (0..MINUTES_PER_DAY / slot_minutes)
        .map(|index| {
            let slot_start = index * slot_minutes;
            let slot_end = slot_start + slot_minutes;
            let (user, hidden_user) = pick(&placements, Owner::User, slot_start, slot_end);
            let (partner, hidden_partner) =
                pick(&placements, Owner::Partner, slot_start, slot_end);

            DualSlot {
                time: TimeOfDay::from_minute(slot_start),
                user,
                partner,
                hidden_user,
                hidden_partner,
            }
        })
        .collect();

    Ok(DualView {
        date,
        slot_minutes,
        slots,
        rejected: buckets.rejected,
    })
}

fn covers(p: &Placement, slot_start: u32, slot_end: u32) -> bool {
    if p.start_minute == p.end_minute {
        return p.start_minute >= slot_start && p.start_minute < slot_end;
    }
    p.start_minute < slot_end && p.end_minute > slot_start
}

/// Earliest start wins; equal starts go to the lowest id regardless of length.
fn pick(
    placements: &[Placement],
    owner: Owner,
    slot_start: u32,
    slot_end: u32,
) -> (Option<String>, usize) {
    let candidates: Vec<&Placement> = placements
        .iter()
        .filter(|p| p.owner == owner && covers(p, slot_start, slot_end))
        .collect();

    let winner = candidates
        .iter()
        .min_by(|a, b| a.start.cmp(&b.start).then_with(|| a.event_id.cmp(&b.event_id)));

    match winner {
        Some(winner) => (Some(winner.title.clone()), candidates.len() - 1),
        None => (None, 0),
    }
}
