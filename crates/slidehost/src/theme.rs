use anyhow::Result;
use eframe::egui::Color32;

use crate::storage::PreferenceStore;

/// Storage key holding the literal `"dark"` or `"light"`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Dark,
    #[default]
    Light,
}

impl ThemePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn from_dark_flag(prefers_dark: bool) -> Self {
        if prefers_dark { Self::Dark } else { Self::Light }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colours the viewer window paints with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub foreground: Color32,
    pub accent: Color32,
    pub muted: Color32,
    pub surface: Color32,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            accent: Color32::from_rgb(0x52, 0x94, 0xE2),
            muted: Color32::from_rgb(0x80, 0x80, 0x80),
            surface: Color32::from_rgb(0x2D, 0x2D, 0x2D),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            muted: Color32::from_rgb(0x6B, 0x6B, 0x7B),
            surface: Color32::from_rgb(0xF5, 0xF5, 0xF5),
        }
    }

    pub fn for_preference(pref: ThemePreference) -> Self {
        match pref {
            ThemePreference::Dark => Self::dark(),
            ThemePreference::Light => Self::light(),
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }
}

/// Where the active theme becomes visible: window visuals, or nothing in the terminal.
pub trait ThemeSurface {
    fn apply_theme(&mut self, theme: ThemePreference);
}

/// Resolves, persists and applies the light/dark preference.
///
/// An explicit choice always beats the OS setting; OS changes are only
/// followed while nothing has been persisted.
pub struct ThemeController<S, V> {
    store: S,
    surface: V,
    current: ThemePreference,
}

impl<S: PreferenceStore, V: ThemeSurface> ThemeController<S, V> {
    pub fn new(store: S, surface: V) -> Self {
        Self {
            store,
            surface,
            current: ThemePreference::default(),
        }
    }

    pub fn initialize(&mut self, os_prefers_dark: Option<bool>) -> ThemePreference {
        self.current = self
            .stored()
            .or_else(|| os_prefers_dark.map(ThemePreference::from_dark_flag))
            .unwrap_or_default();
        tracing::debug!(theme = %self.current, "theme initialized");
        self.surface.apply_theme(self.current);
        self.current
    }

    pub fn toggle(&mut self) -> Result<ThemePreference> {
        let next = self.current.toggled();
        self.set(next)?;
        Ok(next)
    }

    /// Explicit user choice: persisted, so later OS changes are ignored.
    pub fn set(&mut self, theme: ThemePreference) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.current = theme;
        self.surface.apply_theme(theme);
        Ok(())
    }

    /// Forget the explicit choice and fall back to the OS setting.
    pub fn reset(&mut self, os_prefers_dark: Option<bool>) -> Result<ThemePreference> {
        self.store.remove(THEME_KEY)?;
        Ok(self.initialize(os_prefers_dark))
    }

    pub fn on_system_preference_change(&mut self, prefers_dark: bool) {
        if self.has_explicit_preference() {
            tracing::debug!("ignoring OS theme change, user preference is set");
            return;
        }
        let theme = ThemePreference::from_dark_flag(prefers_dark);
        if theme != self.current {
            self.current = theme;
            self.surface.apply_theme(theme);
        }
    }

    pub fn has_explicit_preference(&self) -> bool {
        self.stored().is_some()
    }

    pub fn current(&self) -> ThemePreference {
        self.current
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut V {
        &mut self.surface
    }

    fn stored(&self) -> Option<ThemePreference> {
        self.store
            .get(THEME_KEY)
            .and_then(|v| ThemePreference::parse(&v))
    }
}
