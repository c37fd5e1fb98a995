use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = load_existing(&path)?;

    println!("{} {}", "Config file:".bold(), path.display());
    println!();
    println!("  server.url           {}", config.server_url());
    println!(
        "  index.embedded       {}",
        config
            .embedded_index()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".dimmed().to_string())
    );
    println!("  viewer.narrow_width  {}", config.narrow_width());
    println!(
        "  viewer.mode          {}",
        config
            .viewer_mode()
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| "paged".dimmed().to_string())
    );
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let path = Config::path()?;
    let mut config = load_existing(&path)?;
    config.set(key, value)?;
    let saved = config.save()?;
    println!("{} {key} = {value}", "Set".green().bold());
    tracing::debug!(path = %saved.display(), "config saved");
    Ok(())
}

/// A missing file is an empty config; a present but unreadable one is an error.
fn load_existing(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load_from(path)
    } else {
        Ok(Config::default())
    }
}
