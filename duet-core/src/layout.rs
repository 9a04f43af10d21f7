//! Column and vertical geometry for overlap clusters.
//!
//! Width is divided evenly between the members of a cluster, up to
//! `max_columns`. Larger clusters render the first `max_columns` members and
//! a "+N" marker in a gutter after the last column.

use serde::{Deserialize, Serialize};

use crate::bucket::{MINUTES_PER_DAY, Placement};
use crate::error::{DuetError, DuetResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub available_width: f32,
    pub pixels_per_minute: f32,
    pub min_height: f32,
    pub max_columns: usize,
    /// Width reserved for the "+N" marker when a cluster overflows
    pub overflow_width: f32,
    pub slot_minutes: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            available_width: 300.0,
            pixels_per_minute: 1.0,
            min_height: 20.0,
            max_columns: 3,
            overflow_width: 24.0,
            slot_minutes: 30,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> DuetResult<()> {
        if !(self.available_width > 0.0) {
            return Err(DuetError::Config("available_width must be positive".into()));
        }
        if !(self.pixels_per_minute > 0.0) {
            return Err(DuetError::Config("pixels_per_minute must be positive".into()));
        }
        if self.min_height < 0.0 {
            return Err(DuetError::Config("min_height cannot be negative".into()));
        }
        if self.max_columns == 0 {
            return Err(DuetError::Config("max_columns must be at least 1".into()));
        }
        if !(self.overflow_width >= 0.0 && self.overflow_width < self.available_width) {
            return Err(DuetError::Config(
                "overflow_width must be between 0 and available_width".into(),
            ));
        }
        if self.slot_minutes == 0 || MINUTES_PER_DAY % self.slot_minutes != 0 {
            return Err(DuetError::Config(format!(
                "slot_minutes must divide {MINUTES_PER_DAY}, got {}",
                self.slot_minutes
            )));
        }
        Ok(())
    }

    /// Total height of one day column.
    pub fn day_height(&self) -> f32 {
        MINUTES_PER_DAY as f32 * self.pixels_per_minute
    }

    fn top(&self, minute: u32) -> f32 {
        minute as f32 * self.pixels_per_minute
    }

    fn height(&self, minutes: u32) -> f32 {
        (minutes as f32 * self.pixels_per_minute).max(self.min_height)
    }
}

/// Where one event is drawn inside its day column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBox {
    pub event_id: String,
    pub title: String,
    /// Zone the minutes are wall-clock times in
    pub zone: String,
    pub start_minute: u32,
    pub end_minute: u32,
    pub column: usize,
    pub columns: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub continues_before: bool,
    pub continues_after: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverflowMarker {
    pub hidden: usize,
    pub hidden_ids: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl OverflowMarker {
    pub fn label(&self) -> String {
        format!("+{}", self.hidden)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterLayout {
    pub boxes: Vec<EventBox>,
    pub overflow: Option<OverflowMarker>,
}

impl ClusterLayout {
    /// Number of events in the cluster, rendered or not.
    pub fn len(&self) -> usize {
        self.boxes.len() + self.overflow.as_ref().map_or(0, |o| o.hidden)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start_minute(&self) -> u32 {
        self.boxes.iter().map(|b| b.start_minute).min().unwrap_or(0)
    }

    pub fn end_minute(&self) -> u32 {
        self.boxes.iter().map(|b| b.end_minute).max().unwrap_or(0)
    }
}

/// Lay out one overlap cluster. Members keep the order they are given in;
/// the first `max_columns` of them are rendered.
pub fn layout_cluster(cluster: &[&Placement], config: &LayoutConfig) -> ClusterLayout {
    let cap = config.max_columns.max(1);
    let overflowing = cluster.len() > cap;
    let columns = cluster.len().clamp(1, cap);

    let usable_width = if overflowing {
        config.available_width - config.overflow_width
    } else {
        config.available_width
    };
    let column_width = usable_width / columns as f32;

    let boxes: Vec<EventBox> = cluster
        .iter()
        .take(cap)
        .enumerate()
        .map(|(column, p)| EventBox {
            event_id: p.event_id.clone(),
            title: p.title.clone(),
            zone: p.zone.clone(),
            start_minute: p.start_minute,
            end_minute: p.end_minute,
            column,
            columns,
            x: column as f32 * column_width,
            y: config.top(p.start_minute),
            width: column_width,
            height: config.height(p.duration_minutes()),
            continues_before: p.continues_before,
            continues_after: p.continues_after,
        })
        .collect();

    let overflow = overflowing.then(|| {
        let hidden: Vec<String> = cluster[cap..].iter().map(|p| p.event_id.clone()).collect();
        OverflowMarker {
            hidden: hidden.len(),
            hidden_ids: hidden,
            x: columns as f32 * column_width,
            y: boxes.first().map_or(0.0, |b| b.y),
            width: config.overflow_width,
            height: config.min_height,
        }
    });

    ClusterLayout { boxes, overflow }
}
