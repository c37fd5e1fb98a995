use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::{ThemeCommands, ThemeName};
use crate::storage::FileStore;
use crate::theme::{ThemeController, ThemePreference, ThemeSurface};

/// The terminal has no theme of its own; remember what was applied for reporting.
#[derive(Default)]
struct Applied(Option<ThemePreference>);

impl ThemeSurface for Applied {
    fn apply_theme(&mut self, theme: ThemePreference) {
        self.0 = Some(theme);
    }
}

impl From<ThemeName> for ThemePreference {
    fn from(name: ThemeName) -> Self {
        match name {
            ThemeName::Light => ThemePreference::Light,
            ThemeName::Dark => ThemePreference::Dark,
        }
    }
}

pub fn run(ctx: &Context, command: ThemeCommands) -> Result<()> {
    let store = FileStore::open_default()?;
    let store_path = store.path().to_path_buf();
    let mut theme = ThemeController::new(store, Applied::default());
    theme.initialize(None);

    let show_location = matches!(command, ThemeCommands::Show);
    match command {
        ThemeCommands::Show => {}
        ThemeCommands::Toggle => {
            theme.toggle()?;
        }
        ThemeCommands::Set { theme: name } => theme.set(name.into())?,
        ThemeCommands::Reset => {
            theme.reset(None)?;
        }
    }

    let source = if theme.has_explicit_preference() {
        "saved preference"
    } else {
        "system default"
    };
    let applied = theme.surface().0.unwrap_or(theme.current());
    if ctx.quiet {
        println!("{applied}");
    } else {
        println!("Theme: {} ({})", applied.to_string().bold(), source.dimmed());
        if show_location {
            println!("{} {}", "Stored in:".dimmed(), store_path.display());
        }
    }
    Ok(())
}
