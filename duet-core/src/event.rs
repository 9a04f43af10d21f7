//! Timeline event types.
//!
//! Events arrive from whichever screen or file loaded them and are handed
//! to the layout passes as plain in-memory lists. Instants are always
//! stored in UTC; the zone an event is rendered in is decided later by
//! [`crate::timezone::DisplayZone`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DuetError, DuetResult};
use crate::timezone::parse_tz;

/// A calendar event shown on the shared timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone stamped on the event when it was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timezone: Option<String>,
    /// All-day events carry UTC-midnight instants and span whole dates
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub priority: EventPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub owner: Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Date,
    Anniversary,
    Meeting,
    Reminder,
    Task,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    #[default]
    Personal,
    Shared,
    Work,
    Health,
    Social,
}

impl EventCategory {
    /// Map an ICS CATEGORIES value onto a category (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(EventCategory::Personal),
            "shared" | "couple" => Some(EventCategory::Shared),
            "work" | "business" => Some(EventCategory::Work),
            "health" | "fitness" => Some(EventCategory::Health),
            "social" => Some(EventCategory::Social),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl EventPriority {
    /// Map an RFC 5545 PRIORITY value (0 = undefined, 1 = highest, 9 = lowest).
    pub fn from_ics(value: u8) -> Self {
        match value {
            1..=4 => EventPriority::High,
            6..=9 => EventPriority::Low,
            _ => EventPriority::Normal,
        }
    }
}

/// Whose calendar an event belongs to in the dual view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    #[default]
    User,
    Partner,
}

/// Recurrence rule for a master event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// RRULE value without the `RRULE:` prefix, e.g. `FREQ=WEEKLY;BYDAY=FR`
    pub rrule: String,
    /// Occurrence start instants to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exdates: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// Minutes before start at which to notify
    #[serde(default)]
    pub minutes_before: Vec<i64>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            minutes_before: Vec::new(),
        }
    }
}

/// An event that could not be placed on the timeline, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEvent {
    pub event_id: String,
    pub reason: String,
}

impl RejectedEvent {
    pub fn new(event_id: &str, err: &DuetError) -> Self {
        RejectedEvent {
            event_id: event_id.to_string(),
            reason: err.to_string(),
        }
    }
}

impl TimelineEvent {
    /// Create a timed event with default type, category, and priority.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        TimelineEvent {
            id: id.into(),
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            source_timezone: None,
            all_day: false,
            event_type: EventType::default(),
            category: EventCategory::default(),
            priority: EventPriority::default(),
            recurrence: None,
            notifications: NotificationSettings::default(),
            owner: Owner::default(),
        }
    }

    pub fn with_source_timezone(mut self, tzid: impl Into<String>) -> Self {
        self.source_timezone = Some(tzid.into());
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Check the invariants the layout passes rely on.
    pub fn validate(&self) -> DuetResult<()> {
        if self.end < self.start {
            return Err(DuetError::InvalidRange {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        if let Some(tzid) = &self.source_timezone {
            parse_tz(tzid)?;
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// End used for overlap checks; zero-length events occupy one minute.
    pub fn visible_end(&self) -> DateTime<Utc> {
        self.end.max(self.start + Duration::minutes(1))
    }

    /// Half-open `[start, end)` intersection test.
    pub fn overlaps(&self, other: &TimelineEvent) -> bool {
        self.start < other.visible_end() && other.start < self.visible_end()
    }
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
