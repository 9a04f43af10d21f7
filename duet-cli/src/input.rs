//! Argument handling shared by the view commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, ValueEnum};
use duet_core::TimelineEvent;
use duet_core::config::DuetConfig;
use duet_core::overlap::GroupingStrategy;
use duet_core::source::load_events;
use duet_core::timezone::{TimezonePolicy, parse_tz};

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Viewer,
    Source,
}

impl From<PolicyArg> for TimezonePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Viewer => TimezonePolicy::Viewer,
            PolicyArg::Source => TimezonePolicy::Source,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupingArg {
    Adjacent,
    Sweep,
}

impl From<GroupingArg> for GroupingStrategy {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Adjacent => GroupingStrategy::Adjacent,
            GroupingArg::Sweep => GroupingStrategy::Sweep,
        }
    }
}

/// Flags that override the config file for one invocation.
#[derive(Args)]
pub struct DisplayArgs {
    /// Viewer timezone (IANA name)
    #[arg(long)]
    pub tz: Option<String>,

    /// Render in the viewer's zone or each event's source zone
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// How overlapping events are grouped
    #[arg(long, value_enum)]
    pub grouping: Option<GroupingArg>,

    /// Print the layout as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Load the config file and apply command-line overrides.
pub fn load_config(path: &Path, display: &DisplayArgs) -> Result<DuetConfig> {
    let mut config = DuetConfig::load_from(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if let Some(tz) = &display.tz {
        config.viewer_timezone = Some(tz.clone());
    }
    if let Some(policy) = display.policy {
        config.timezone_policy = policy.into();
    }
    if let Some(grouping) = display.grouping {
        config.grouping = grouping.into();
    }

    config.validate()?;
    Ok(config)
}

pub fn load_all(files: &[PathBuf], floating_zone: Tz) -> Result<Vec<TimelineEvent>> {
    let mut events = Vec::new();
    for path in files {
        let loaded = load_events(path, floating_zone)
            .with_context(|| format!("failed to load events from {}", path.display()))?;
        events.extend(loaded);
    }
    Ok(events)
}

/// Parse a date argument relative to today in `tz`.
pub fn parse_date(input: Option<&str>, tz: Tz) -> Result<NaiveDate> {
    let today = Utc::now().with_timezone(&tz).date_naive();

    match input.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("tomorrow") => Ok(today + Duration::days(1)),
        Some("yesterday") => Ok(today - Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", s)),
    }
}

/// Parse YYYY-MM, defaulting to the current month in `tz`.
pub fn parse_month(input: Option<&str>, tz: Tz) -> Result<(i32, u32)> {
    match input.map(str::trim) {
        None => {
            let today = Utc::now().with_timezone(&tz).date_naive();
            Ok((today.year(), today.month()))
        }
        Some(s) => {
            let first = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("Invalid month '{}'. Expected YYYY-MM", s))?;
            Ok((first.year(), first.month()))
        }
    }
}

pub fn parse_zone(name: &str) -> Result<Tz> {
    Ok(parse_tz(name)?)
}
