use std::path::{Path, PathBuf};

use anyhow::Result;
use duet_core::timeline::month_view;
use owo_colors::OwoColorize;
use tracing::info;

use super::{print_json, report_rejected};
use crate::input::{DisplayArgs, load_all, load_config, parse_month};
use crate::render::Render;

pub fn run(
    config_path: &Path,
    month: Option<&str>,
    files: &[PathBuf],
    display: &DisplayArgs,
) -> Result<()> {
    let options = load_config(config_path, display)?.timeline_options()?;
    let (year, month) = parse_month(month, options.zones.viewer)?;
    let events = load_all(files, options.zones.viewer)?;

    info!(year, month, events = events.len(), "rendering month");
    let view = month_view(&events, year, month, &options)?;

    if display.json {
        return print_json(&view);
    }

    println!("{}", format!("{year}-{month:02}").bold());
    println!();
    println!("{}", view.render());

    report_rejected(&view.rejected);
    Ok(())
}
