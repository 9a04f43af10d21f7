use std::path::Path;

use anyhow::{Context, Result};
use duet_core::config::DuetConfig;
use owo_colors::OwoColorize;

pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}\n\nUse --force to overwrite it.",
            config_path.display()
        );
    }

    DuetConfig::create_default_config(config_path)?;
    println!("{} {}", "Created".green(), config_path.display());
    Ok(())
}

pub fn show(config_path: &Path) -> Result<()> {
    let config = DuetConfig::load_from(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let viewer = config.viewer_zone()?;

    println!("{}", "Effective configuration".bold());
    println!("  Viewer timezone:  {}", viewer.name());
    println!("  Timezone policy:  {:?}", config.timezone_policy);
    println!("  Week start:       {:?}", config.week_start);
    println!("  Grouping:         {:?}", config.grouping);
    println!();
    println!("{}", "Layout".bold());
    println!("  Available width:  {}", config.layout.available_width);
    println!("  Pixels/minute:    {}", config.layout.pixels_per_minute);
    println!("  Min height:       {}", config.layout.min_height);
    println!("  Max columns:      {}", config.layout.max_columns);
    println!("  Overflow width:   {}", config.layout.overflow_width);
    println!("  Slot minutes:     {}", config.layout.slot_minutes);

    Ok(())
}

pub fn path(config_path: &Path) -> Result<()> {
    let state = if config_path.exists() {
        "exists".green().to_string()
    } else {
        "not created".dimmed().to_string()
    };
    println!("{} ({})", config_path.display(), state);
    Ok(())
}
