//! TUI rendering traits for duet layouts.
//!
//! This module provides extension traits that add colored terminal rendering
//! to duet-core types using owo_colors.

use duet_core::RejectedEvent;
use duet_core::dual::{DualSlot, DualView};
use duet_core::layout::{ClusterLayout, EventBox};
use duet_core::timeline::{DayLayout, MonthCell, MonthView};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Format minutes since midnight as HH:MM (1440 renders as 24:00).
pub fn clock(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

impl Render for EventBox {
    fn render(&self) -> String {
        let before = if self.continues_before { "…" } else { "" };
        let after = if self.continues_after { "…" } else { "" };
        let time = format!(
            "{}{}–{}{}",
            before,
            clock(self.start_minute),
            clock(self.end_minute),
            after
        );
        let column = format!("[{}/{}]", self.column + 1, self.columns);

        format!("{} {} {}", column.dimmed(), time.cyan(), self.title)
    }
}

/// Rendering that labels each event box with the zone its times are in.
pub trait ZonedRender {
    fn render_with_zones(&self) -> String;
}

impl ZonedRender for EventBox {
    fn render_with_zones(&self) -> String {
        format!("{} {}", self.render(), format!("({})", self.zone).dimmed())
    }
}

fn render_cluster(cluster: &ClusterLayout, zones: bool) -> String {
    let mut lines: Vec<String> = cluster
        .boxes
        .iter()
        .map(|b| {
            let line = if zones { b.render_with_zones() } else { b.render() };
            format!("  {line}")
        })
        .collect();

    if let Some(marker) = &cluster.overflow {
        lines.push(format!(
            "  {} {}",
            marker.label().yellow().bold(),
            format!("({})", marker.hidden_ids.join(", ")).dimmed()
        ));
    }

    lines.join("\n")
}

fn render_day(day: &DayLayout, zones: bool) -> String {
    let mut lines = vec![day.date.format("%a %b %-d").to_string().bold().to_string()];

    for entry in &day.all_day {
        lines.push(format!("  {} {}", "all-day".magenta(), entry.title));
    }

    if day.clusters.is_empty() && day.all_day.is_empty() {
        lines.push(format!("  {}", "No events".dimmed()));
    }

    for (i, cluster) in day.clusters.iter().enumerate() {
        if i > 0 || !day.all_day.is_empty() {
            lines.push(String::new());
        }
        lines.push(render_cluster(cluster, zones));
    }

    lines.join("\n")
}

impl Render for ClusterLayout {
    fn render(&self) -> String {
        render_cluster(self, false)
    }
}

impl Render for DayLayout {
    fn render(&self) -> String {
        render_day(self, false)
    }
}

impl ZonedRender for DayLayout {
    fn render_with_zones(&self) -> String {
        render_day(self, true)
    }
}

impl Render for MonthCell {
    fn render(&self) -> String {
        let day = format!("{:>2}", self.date.format("%-d"));
        let day = if self.in_month {
            day.bold().to_string()
        } else {
            day.dimmed().to_string()
        };

        let mut parts = vec![day];
        parts.extend(self.titles.iter().cloned());
        if self.overflow > 0 {
            parts.push(format!("+{}", self.overflow).yellow().to_string());
        }
        parts.join("  ")
    }
}

impl Render for MonthView {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for (i, week) in self.weeks.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            for cell in week {
                let line = cell.render();
                lines.push(if cell.titles.is_empty() && cell.overflow == 0 {
                    line.dimmed().to_string()
                } else {
                    line
                });
            }
        }

        lines.join("\n")
    }
}

impl Render for DualSlot {
    fn render(&self) -> String {
        let side = |title: &Option<String>, hidden: usize| {
            let text = title.clone().unwrap_or_else(|| "·".to_string());
            let text = format!("{text:<28}");
            let hidden = if hidden > 0 {
                format!(" +{hidden}").yellow().to_string()
            } else {
                String::new()
            };
            format!("{text}{hidden}")
        };

        format!(
            "{}  {}  {}",
            self.time.to_string().cyan(),
            side(&self.user, self.hidden_user).green(),
            side(&self.partner, self.hidden_partner).blue()
        )
    }
}

/// Dual view rendering, optionally including empty slots.
pub trait DualViewRender {
    fn render(&self, all: bool) -> String;
}

impl DualViewRender for DualView {
    fn render(&self, all: bool) -> String {
        let mut lines = vec![format!(
            "{}  {:<28}  {}",
            self.date.format("%a %b %-d").to_string().bold(),
            "You".green().bold(),
            "Partner".blue().bold()
        )];

        let slots: Vec<&DualSlot> = if all {
            self.slots.iter().collect()
        } else {
            self.occupied().collect()
        };

        if slots.is_empty() {
            lines.push(format!("  {}", "No events".dimmed()));
        }
        lines.extend(slots.iter().map(|s| s.render()));

        lines.join("\n")
    }
}

impl Render for RejectedEvent {
    fn render(&self) -> String {
        format!("{} {} {}", "!".red(), self.event_id.red(), self.reason.dimmed())
    }
}

/// Render the rejected events footer, or nothing when there are none.
pub fn render_rejected(rejected: &[RejectedEvent]) -> Option<String> {
    if rejected.is_empty() {
        return None;
    }

    let mut lines = vec![format!("Skipped {} event(s):", rejected.len()).red().to_string()];
    lines.extend(rejected.iter().map(|r| format!("   {}", r.render())));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_formatting() {
        assert_eq!(clock(0), "00:00");
        assert_eq!(clock(9 * 60 + 5), "09:05");
        assert_eq!(clock(1440), "24:00");
    }

    #[test]
    fn test_zoned_render_labels_box_with_its_zone() {
        let event_box = EventBox {
            event_id: "a".to_string(),
            title: "Flight".to_string(),
            zone: "America/New_York".to_string(),
            start_minute: 9 * 60,
            end_minute: 10 * 60,
            column: 0,
            columns: 1,
            x: 0.0,
            y: 540.0,
            width: 300.0,
            height: 60.0,
            continues_before: false,
            continues_after: false,
        };

        assert!(!event_box.render().contains("America/New_York"));
        assert!(event_box.render_with_zones().contains("(America/New_York)"));
    }

    #[test]
    fn test_no_rejected_footer_when_empty() {
        assert!(render_rejected(&[]).is_none());
    }
}
