use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use duet_core::timezone::{from_local, to_zone};
use owo_colors::OwoColorize;

use crate::input::parse_zone;

const WALL_CLOCK_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn run(time: &str, to: &str, from: Option<&str>) -> Result<()> {
    let target = parse_zone(to)?;

    let instant = match from {
        Some(zone) => {
            let source = parse_zone(zone)?;
            let wall = parse_wall_clock(time)?;
            from_local(wall, source)?
        }
        None => DateTime::parse_from_rfc3339(time)
            .with_context(|| format!("Invalid instant '{time}'. Expected RFC 3339 or use --from"))?
            .with_timezone(&Utc),
    };

    let local = to_zone(instant, target);
    // The displayed local time must map back to the same instant
    let back = local.with_timezone(&Utc);

    println!("{}  {}", "UTC".dimmed(), instant.to_rfc3339());
    println!("{}  {}", target.name().bold(), local.to_rfc3339());
    if back != instant {
        anyhow::bail!("round trip through {} changed the instant", target.name());
    }

    Ok(())
}

fn parse_wall_clock(input: &str) -> Result<NaiveDateTime> {
    WALL_CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid time '{input}'. Expected YYYY-MM-DDTHH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_with_and_without_seconds() {
        assert!(parse_wall_clock("2025-03-20T15:00").is_ok());
        assert!(parse_wall_clock("2025-03-20T15:00:30").is_ok());
        assert!(parse_wall_clock("15:00").is_err());
    }
}
