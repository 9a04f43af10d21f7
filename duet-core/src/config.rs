//! Global duet configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DuetError, DuetResult};
use crate::layout::LayoutConfig;
use crate::overlap::GroupingStrategy;
use crate::timeline::{TimelineOptions, WeekStart};
use crate::timezone::{DisplayZone, TimezonePolicy, parse_tz, system_timezone};

/// Configuration at ~/.config/duet/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DuetConfig {
    /// IANA zone of the viewer; the system zone when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_timezone: Option<String>,
    pub timezone_policy: TimezonePolicy,
    pub week_start: WeekStart,
    pub grouping: GroupingStrategy,
    pub layout: LayoutConfig,
}

impl DuetConfig {
    pub fn config_path() -> DuetResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DuetError::Config("Could not determine config directory".into()))?
            .join("duet");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> DuetResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> DuetResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(DuetConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DuetError::Config(format!("Could not read {}: {e}", path.display())))?;
        let config: DuetConfig = toml::from_str(&content)
            .map_err(|e| DuetError::Config(format!("Invalid {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> DuetResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| DuetError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DuetError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| DuetError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DuetResult<()> {
        let defaults = LayoutConfig::default();
        let contents = format!(
            "\
# duet configuration

# Zone the timeline is shown in (defaults to the system zone):
# viewer_timezone = \"Europe/Berlin\"

# \"viewer\" renders every event in viewer_timezone,
# \"source\" renders each event in the zone it was created in:
# timezone_policy = \"viewer\"

# First day of the week view, \"monday\" or \"sunday\":
# week_start = \"monday\"

# \"sweep\" groups every overlapping event together,
# \"adjacent\" only compares each event with the one before it:
# grouping = \"sweep\"

[layout]
# available_width = {}
# pixels_per_minute = {}
# min_height = {}
# max_columns = {}
# overflow_width = {}
# slot_minutes = {}
",
            defaults.available_width,
            defaults.pixels_per_minute,
            defaults.min_height,
            defaults.max_columns,
            defaults.overflow_width,
            defaults.slot_minutes,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DuetError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DuetError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn validate(&self) -> DuetResult<()> {
        if let Some(name) = &self.viewer_timezone {
            parse_tz(name)?;
        }
        self.layout.validate()
    }

    pub fn viewer_zone(&self) -> DuetResult<Tz> {
        match &self.viewer_timezone {
            Some(name) => parse_tz(name),
            None => Ok(system_timezone()),
        }
    }

    pub fn timeline_options(&self) -> DuetResult<TimelineOptions> {
        self.validate()?;
        Ok(TimelineOptions {
            zones: DisplayZone::new(self.timezone_policy, self.viewer_zone()?),
            grouping: self.grouping,
            layout: self.layout.clone(),
            week_start: self.week_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = DuetConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, DuetConfig::default());
    }

    #[test]
    fn test_commented_default_file_parses_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("duet").join("config.toml");

        DuetConfig::create_default_config(&path).unwrap();
        let config = DuetConfig::load_from(&path).unwrap();

        assert_eq!(config, DuetConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_only_given_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "viewer_timezone = \"Asia/Tokyo\"\ntimezone_policy = \"source\"\n\n[layout]\nmax_columns = 4\n",
        )
        .unwrap();

        let config = DuetConfig::load_from(&path).unwrap();
        assert_eq!(config.timezone_policy, TimezonePolicy::Source);
        assert_eq!(config.layout.max_columns, 4);
        assert_eq!(config.layout.slot_minutes, 30);
        assert_eq!(config.week_start, WeekStart::Monday);

        let options = config.timeline_options().unwrap();
        assert_eq!(options.zones.viewer, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "viewer_timezone = \"Moon/Crater\"\n").unwrap();
        assert!(matches!(
            DuetConfig::load_from(&path),
            Err(DuetError::UnknownTimezone(_))
        ));

        std::fs::write(&path, "[layout]\nslot_minutes = 25\n").unwrap();
        assert!(matches!(DuetConfig::load_from(&path), Err(DuetError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = DuetConfig {
            viewer_timezone: Some("America/Chicago".into()),
            week_start: WeekStart::Sunday,
            grouping: GroupingStrategy::Adjacent,
            ..DuetConfig::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(DuetConfig::load_from(&path).unwrap(), config);
    }
}
