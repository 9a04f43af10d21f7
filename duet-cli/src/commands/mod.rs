pub mod config;
pub mod convert;
pub mod dual;
pub mod month;
pub mod timeline;

use anyhow::Result;
use serde_json::to_string_pretty;

use crate::render::render_rejected;
use duet_core::RejectedEvent;

/// Print a layout as pretty JSON.
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", to_string_pretty(value)?);
    Ok(())
}

/// Report rejected events on stderr so stdout stays clean for piping.
fn report_rejected(rejected: &[RejectedEvent]) {
    if let Some(footer) = render_rejected(rejected) {
        eprintln!("\n{footer}");
    }
}
