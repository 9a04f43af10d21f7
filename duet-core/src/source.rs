//! Loading events from files on disk.

use std::path::Path;

use chrono_tz::Tz;
use tracing::info;

use crate::error::{DuetError, DuetResult};
use crate::event::{Owner, TimelineEvent};
use crate::ics::parse_events;

/// Load events from a `.ics` file or a JSON array of events.
///
/// `floating_zone` is used for ICS times that carry no zone.
pub fn load_events(path: &Path, floating_zone: Tz) -> DuetResult<Vec<TimelineEvent>> {
    let content = std::fs::read_to_string(path)?;

    let events = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ics") => parse_events(&content, floating_zone)?,
        _ => serde_json::from_str(&content).map_err(|e| {
            DuetError::Serialization(format!("{}: {e}", path.display()))
        })?,
    };

    info!(path = %path.display(), events = events.len(), "loaded events");
    Ok(events)
}

/// Load events and mark all of them as belonging to `owner`.
pub fn load_owned_events(
    path: &Path,
    floating_zone: Tz,
    owner: Owner,
) -> DuetResult<Vec<TimelineEvent>> {
    let mut events = load_events(path, floating_zone)?;
    for event in &mut events {
        event.owner = owner;
    }
    Ok(events)
}
