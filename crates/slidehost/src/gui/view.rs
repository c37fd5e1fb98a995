use eframe::egui;
use url::Url;

use crate::model::ViewerMode;
use crate::theme::{Palette, ThemePreference, ThemeSurface};
use crate::viewer::{
    CopyTarget, EnvError, OverviewEntry, Preview, ShareLinks, SlotRole, ViewerView,
};

#[derive(Debug, Clone, Default)]
pub struct SlotState {
    pub src: Option<String>,
    pub role: Option<SlotRole>,
}

/// Retained view model the window paints from each frame.
///
/// Platform requests (clipboard, viewport commands, navigation) are queued
/// here and flushed by the app after the controller call returns.
pub struct EguiView {
    pub slots: [SlotState; 3],
    pub progress: f32,
    pub nav: (bool, bool),
    pub title: String,
    pub loading: bool,
    pub mode: ViewerMode,
    pub pages: Vec<String>,
    pub scroll_target: Option<usize>,
    pub preview: Option<Preview>,
    pub overview: Vec<OverviewEntry>,
    pub overview_open: bool,
    pub overview_current: usize,
    pub share: Option<ShareLinks>,
    pub copied: Option<CopyTarget>,
    pub alert: Option<String>,
    pub fullscreen_icon: bool,
    pub controls_visible: bool,
    pub close_to_list: bool,
    pub navigate_to: Option<Url>,
    pub pending_clipboard: Vec<String>,
    pub pending_commands: Vec<egui::ViewportCommand>,
}

impl Default for EguiView {
    fn default() -> Self {
        Self {
            slots: Default::default(),
            progress: 0.0,
            nav: (false, false),
            title: String::new(),
            loading: false,
            mode: ViewerMode::Paged,
            pages: Vec::new(),
            scroll_target: None,
            preview: None,
            overview: Vec::new(),
            overview_open: false,
            overview_current: 1,
            share: None,
            copied: None,
            alert: None,
            fullscreen_icon: false,
            controls_visible: true,
            close_to_list: false,
            navigate_to: None,
            pending_clipboard: Vec::new(),
            pending_commands: Vec::new(),
        }
    }
}

impl EguiView {
    pub fn current_src(&self) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.role == Some(SlotRole::Current))
            .and_then(|s| s.src.as_deref())
    }
}

impl ViewerView for EguiView {
    fn set_slot(&mut self, slot: usize, role: SlotRole, src: Option<&str>) {
        self.slots[slot] = SlotState {
            src: src.map(str::to_string),
            role: Some(role),
        };
    }

    fn set_progress(&mut self, percent: f32) {
        self.progress = percent;
    }

    fn set_nav_visibility(&mut self, previous: bool, next: bool) {
        self.nav = (previous, next);
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_string();
            self.pending_commands
                .push(egui::ViewportCommand::Title(self.title.clone()));
        }
    }

    fn replace_url(&mut self, url: &Url) {
        tracing::trace!(%url, "location");
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_mode(&mut self, mode: ViewerMode, pages: &[String]) {
        self.mode = mode;
        self.pages = pages.to_vec();
    }

    fn scroll_to_page(&mut self, page: usize) {
        self.scroll_target = Some(page);
    }

    fn show_preview(&mut self, preview: Option<&Preview>) {
        self.preview = preview.cloned();
    }

    fn build_overview(&mut self, entries: &[OverviewEntry]) {
        self.overview = entries.to_vec();
    }

    fn show_overview(&mut self, open: bool, current: usize) {
        self.overview_open = open;
        self.overview_current = current;
    }

    fn show_share(&mut self, links: Option<&ShareLinks>) {
        self.share = links.cloned();
        if self.share.is_none() {
            self.copied = None;
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), EnvError> {
        self.pending_clipboard.push(text.to_string());
        Ok(())
    }

    fn show_copied(&mut self, target: Option<CopyTarget>) {
        self.copied = target;
    }

    fn alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }

    fn request_fullscreen(&mut self, on: bool) -> Result<(), EnvError> {
        self.pending_commands
            .push(egui::ViewportCommand::Fullscreen(on));
        Ok(())
    }

    fn set_fullscreen_icon(&mut self, fullscreen: bool) {
        self.fullscreen_icon = fullscreen;
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    fn show_close_to_list(&mut self, visible: bool) {
        self.close_to_list = visible;
    }

    fn navigate(&mut self, url: &Url) {
        self.navigate_to = Some(url.clone());
        self.pending_commands.push(egui::ViewportCommand::Close);
    }
}

/// Window theme: egui visuals plus the palette the slide area paints with.
pub struct WindowTheme {
    pub palette: Palette,
    pub dirty: bool,
}

impl Default for WindowTheme {
    fn default() -> Self {
        Self {
            palette: Palette::light(),
            dirty: true,
        }
    }
}

impl ThemeSurface for WindowTheme {
    fn apply_theme(&mut self, theme: ThemePreference) {
        self.palette = Palette::for_preference(theme);
        self.dirty = true;
    }
}
