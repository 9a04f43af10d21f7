use std::path::Path;

use anyhow::{Context, Result};
use duet_core::Owner;
use duet_core::dual::dual_view;
use duet_core::source::load_owned_events;
use tracing::info;

use super::{print_json, report_rejected};
use crate::input::{DisplayArgs, load_config, parse_date};
use crate::render::DualViewRender;

pub fn run(
    config_path: &Path,
    date: Option<&str>,
    user: &Path,
    partner: &Path,
    all: bool,
    display: &DisplayArgs,
) -> Result<()> {
    let options = load_config(config_path, display)?.timeline_options()?;
    let date = parse_date(date, options.zones.viewer)?;
    let tz = options.zones.viewer;

    let mut events = load_owned_events(user, tz, Owner::User)
        .with_context(|| format!("failed to load events from {}", user.display()))?;
    events.extend(
        load_owned_events(partner, tz, Owner::Partner)
            .with_context(|| format!("failed to load events from {}", partner.display()))?,
    );

    info!(%date, events = events.len(), "rendering dual view");
    let view = dual_view(&events, date, &options)?;

    if display.json {
        return print_json(&view);
    }

    println!("{}", view.render(all));
    report_rejected(&view.rejected);
    Ok(())
}
