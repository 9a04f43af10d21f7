//! Core types and layout logic for duet timelines.
//!
//! This crate turns lists of calendar events into render-ready geometry:
//! - `bucket` partitions events into per-day, per-slot placements
//! - `overlap` groups placements into overlap clusters
//! - `layout` assigns columns, offsets, and "+N" overflow markers
//! - `timeline` and `dual` run the full pass for day/week/month and
//!   user/partner views

pub mod bucket;
pub mod config;
pub mod dual;
pub mod error;
pub mod event;
pub mod ics;
pub mod layout;
pub mod overlap;
pub mod recurrence;
pub mod source;
pub mod timeline;
pub mod timezone;

// Re-export event types at crate root for convenience
pub use error::{DuetError, DuetResult};
pub use event::*;
