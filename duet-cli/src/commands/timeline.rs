use std::path::{Path, PathBuf};

use anyhow::Result;
use duet_core::timeline::{TimelineView, day_view, week_view};
use duet_core::timezone::TimezonePolicy;
use owo_colors::OwoColorize;
use tracing::info;

use super::{print_json, report_rejected};
use crate::input::{DisplayArgs, load_all, load_config, parse_date};
use crate::render::{Render, ZonedRender};

pub fn run_day(
    config_path: &Path,
    date: Option<&str>,
    files: &[PathBuf],
    display: &DisplayArgs,
) -> Result<()> {
    let options = load_config(config_path, display)?.timeline_options()?;
    let date = parse_date(date, options.zones.viewer)?;
    let events = load_all(files, options.zones.viewer)?;

    info!(%date, events = events.len(), "rendering day");
    let view = day_view(&events, date, &options)?;
    print_view(&view, display.json)
}

pub fn run_week(
    config_path: &Path,
    date: Option<&str>,
    files: &[PathBuf],
    display: &DisplayArgs,
) -> Result<()> {
    let options = load_config(config_path, display)?.timeline_options()?;
    let date = parse_date(date, options.zones.viewer)?;
    let events = load_all(files, options.zones.viewer)?;

    info!(%date, events = events.len(), "rendering week");
    let view = week_view(&events, date, &options)?;
    print_view(&view, display.json)
}

fn print_view(view: &TimelineView, json: bool) -> Result<()> {
    if json {
        return print_json(view);
    }

    let header = match view.policy {
        TimezonePolicy::Viewer => format!("Times in {}", view.zone),
        TimezonePolicy::Source => {
            format!("Times in each event's source zone (fallback {})", view.zone)
        }
    };
    println!("{}", header.dimmed());

    for day in &view.days {
        println!();
        match view.policy {
            TimezonePolicy::Viewer => println!("{}", day.render()),
            TimezonePolicy::Source => println!("{}", day.render_with_zones()),
        }
    }

    report_rejected(&view.rejected);
    Ok(())
}
