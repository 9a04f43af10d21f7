//! ICS import.
//!
//! Reads VEVENTs from .ics content into timeline events according to RFC 5545.

mod parse;

pub use parse::parse_events;
