use eframe::egui;
use std::sync::mpsc::Sender;
use std::time::Instant;
use url::Url;

use super::images::ImageStore;
use super::view::{EguiView, WindowTheme};
use crate::api::HttpApi;
use crate::model::ViewerMode;
use crate::storage::FileStore;
use crate::theme::{Palette, ThemeController, ThemePreference};
use crate::viewer::{CopyTarget, Key, Modal, ViewerController, ViewerView};

const KEYS: [(egui::Key, Key); 10] = [
    (egui::Key::ArrowLeft, Key::ArrowLeft),
    (egui::Key::ArrowRight, Key::ArrowRight),
    (egui::Key::ArrowUp, Key::ArrowUp),
    (egui::Key::ArrowDown, Key::ArrowDown),
    (egui::Key::PageUp, Key::PageUp),
    (egui::Key::PageDown, Key::PageDown),
    (egui::Key::Space, Key::Space),
    (egui::Key::Home, Key::Home),
    (egui::Key::End, Key::End),
    (egui::Key::Escape, Key::Escape),
];

const SLIDE_ASPECT: f32 = 9.0 / 16.0;
const SLIDE_MARGIN: f32 = 16.0;
const PAGE_GAP: f32 = 24.0;
/// Share of the width on each side that acts as a previous/next click zone.
const NAV_ZONE: f32 = 0.3;
const PROGRESS_HEIGHT: f32 = 6.0;
/// Extra hit area above the progress bar.
const PROGRESS_HIT: f32 = 10.0;
const PREVIEW_WIDTH: f32 = 192.0;
const THUMB_WIDTH: f32 = 200.0;

/// Deferred UI intents, applied after painting so no view borrow is held.
enum Action {
    Previous,
    Next,
    ProgressClick(f32),
    ProgressHover(f32, f32),
    ProgressLeave,
    Scrolled(Vec<(usize, f32)>, f32),
    OpenOverview,
    SelectOverview(usize),
    CloseModal(Modal),
    OpenShare,
    ShareMode(ViewerMode),
    Copy(CopyTarget),
    ToggleMode,
    ToggleFullscreen,
    ToggleTheme,
    CloseToList,
    DismissAlert,
}

pub struct ViewerApp {
    viewer: ViewerController<EguiView>,
    theme: Option<ThemeController<FileStore, WindowTheme>>,
    images: ImageStore<HttpApi>,
    system_dark: Option<bool>,
    closed_to: Sender<Url>,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        viewer: ViewerController<EguiView>,
        source: HttpApi,
        closed_to: Sender<Url>,
    ) -> Self {
        let system_dark = cc
            .egui_ctx
            .system_theme()
            .map(|t| t == egui::Theme::Dark);
        let theme = match FileStore::open_default() {
            Ok(store) => {
                let mut theme = ThemeController::new(store, WindowTheme::default());
                theme.initialize(system_dark);
                Some(theme)
            }
            Err(e) => {
                tracing::warn!("theme preference unavailable: {e:#}");
                None
            }
        };
        Self {
            viewer,
            theme,
            images: ImageStore::new(source),
            system_dark,
            closed_to,
        }
    }

    fn palette(&self) -> Palette {
        self.theme
            .as_ref()
            .map(|t| t.surface().palette)
            .unwrap_or_else(Palette::light)
    }

    fn is_dark(&self) -> bool {
        self.theme
            .as_ref()
            .is_some_and(|t| t.current() == ThemePreference::Dark)
    }

    fn sync_theme(&mut self, ctx: &egui::Context) {
        let system_dark = ctx.system_theme().map(|t| t == egui::Theme::Dark);
        if system_dark != self.system_dark {
            self.system_dark = system_dark;
            if let (Some(dark), Some(theme)) = (system_dark, self.theme.as_mut()) {
                theme.on_system_preference_change(dark);
            }
        }

        let Some(theme) = self.theme.as_mut() else { return };
        if theme.surface().dirty {
            ctx.set_visuals(match theme.current() {
                ThemePreference::Dark => egui::Visuals::dark(),
                ThemePreference::Light => egui::Visuals::light(),
            });
            theme.surface_mut().dirty = false;
        }
    }

    fn toggle_theme(&mut self) {
        let Some(theme) = self.theme.as_mut() else { return };
        if let Err(e) = theme.toggle() {
            tracing::warn!("saving theme failed: {e:#}");
            self.viewer
                .view_mut()
                .alert(&format!("Could not save the theme: {e}"));
        }
    }

    /// Keep the three paged slots loading and report the ones that finished.
    fn load_slots(&mut self, ctx: &egui::Context) {
        self.images.poll(ctx);
        let mut settled = Vec::new();
        for (slot, state) in self.viewer.view().slots.iter().enumerate() {
            let Some(src) = state.src.as_deref() else { continue };
            self.images.request(ctx, src);
            if self.images.is_settled(src) {
                settled.push(slot);
            }
        }
        for slot in settled {
            self.viewer.on_image_settled(slot);
        }
    }

    fn read_input(&mut self, ctx: &egui::Context, now: Instant) -> Vec<Action> {
        let mut keys = Vec::new();
        let mut actions = Vec::new();
        let mut quit = false;
        let (wheel, moved, fullscreen) = ctx.input(|i| {
            for (egui_key, key) in KEYS {
                if i.key_pressed(egui_key) {
                    keys.push(key);
                }
            }
            if i.key_pressed(egui::Key::G) {
                actions.push(Action::OpenOverview);
            }
            if i.key_pressed(egui::Key::S) {
                actions.push(Action::ToggleMode);
            }
            if i.key_pressed(egui::Key::F) {
                actions.push(Action::ToggleFullscreen);
            }
            if i.key_pressed(egui::Key::D) {
                actions.push(Action::ToggleTheme);
            }
            if i.key_pressed(egui::Key::Q) {
                quit = true;
            }
            (
                i.raw_scroll_delta.y,
                i.pointer.delta() != egui::Vec2::ZERO,
                i.viewport().fullscreen,
            )
        });

        if quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if let Some(fullscreen) = fullscreen {
            self.viewer.on_fullscreen_change(fullscreen);
        }
        if moved {
            self.viewer.on_pointer_move(now);
        }
        for key in keys {
            self.viewer.on_key(key);
        }
        // egui reports wheel-down as negative.
        if wheel != 0.0 && self.viewer.mode() == ViewerMode::Paged {
            self.viewer.on_wheel(-wheel, now);
        }
        actions
    }

    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::Previous => {
                self.viewer.previous();
            }
            Action::Next => {
                self.viewer.next();
            }
            Action::ProgressClick(fraction) => {
                self.viewer.on_progress_click(fraction);
            }
            Action::ProgressHover(fraction, x) => self.viewer.on_progress_hover(fraction, x),
            Action::ProgressLeave => self.viewer.on_progress_leave(),
            Action::Scrolled(centers, viewport_center) => {
                self.viewer.on_scroll(&centers, viewport_center)
            }
            Action::OpenOverview => {
                if self.viewer.top_modal() == Some(Modal::Overview) {
                    self.viewer.close_modal(Modal::Overview);
                } else {
                    self.viewer.open_overview();
                }
            }
            Action::SelectOverview(page) => self.viewer.select_overview(page),
            Action::CloseModal(modal) => self.viewer.close_modal(modal),
            Action::OpenShare => self.viewer.open_share(),
            Action::ShareMode(mode) => self.viewer.set_share_mode(mode),
            Action::Copy(target) => {
                self.viewer.copy_share(target, now);
            }
            Action::ToggleMode => {
                if !self.viewer.is_modal_open() {
                    self.viewer.toggle_mode();
                }
            }
            Action::ToggleFullscreen => self.viewer.toggle_fullscreen(),
            Action::ToggleTheme => self.toggle_theme(),
            Action::CloseToList => {
                self.viewer.close_to_list();
            }
            Action::DismissAlert => self.viewer.view_mut().alert = None,
        }
    }

    /// Hand queued platform requests to egui.
    fn flush(&mut self, ctx: &egui::Context) {
        let view = self.viewer.view_mut();
        for text in view.pending_clipboard.drain(..) {
            ctx.copy_text(text);
        }
        for cmd in view.pending_commands.drain(..) {
            ctx.send_viewport_cmd(cmd);
        }
        if let Some(url) = view.navigate_to.take() {
            let _ = self.closed_to.send(url);
        }
    }

    fn draw_paged(&mut self, ui: &mut egui::Ui, palette: &Palette, actions: &mut Vec<Action>) {
        let rect = ui.max_rect();
        let view = self.viewer.view();
        let area = rect.shrink(SLIDE_MARGIN);

        if let Some(src) = view.current_src() {
            if let Some(texture) = self.images.texture(src) {
                let draw = fit_rect(texture.size_vec2(), area);
                ui.painter()
                    .image(texture.id(), draw, full_uv(), egui::Color32::WHITE);
            } else if self.images.is_failed(src) {
                ui.painter().text(
                    area.center(),
                    egui::Align2::CENTER_CENTER,
                    "Slide image unavailable",
                    egui::FontId::proportional(18.0),
                    palette.muted,
                );
            }
        }
        if view.loading {
            ui.painter().text(
                area.center(),
                egui::Align2::CENTER_CENTER,
                "Loading…",
                egui::FontId::proportional(18.0),
                palette.muted,
            );
        }

        let zone_width = rect.width() * NAV_ZONE;
        let zone_bottom = rect.bottom() - PROGRESS_HEIGHT - PROGRESS_HIT;
        let zones = [
            (
                view.nav.0,
                egui::Rect::from_min_max(
                    rect.min,
                    egui::pos2(rect.left() + zone_width, zone_bottom),
                ),
                "‹",
                "nav-previous",
            ),
            (
                view.nav.1,
                egui::Rect::from_min_max(
                    egui::pos2(rect.right() - zone_width, rect.top()),
                    egui::pos2(rect.right(), zone_bottom),
                ),
                "›",
                "nav-next",
            ),
        ];
        for (index, (visible, zone, glyph, id)) in zones.into_iter().enumerate() {
            if !visible {
                continue;
            }
            let response = ui.interact(zone, ui.id().with(id), egui::Sense::click());
            if response.hovered() && view.controls_visible {
                ui.painter().text(
                    zone.center(),
                    egui::Align2::CENTER_CENTER,
                    glyph,
                    egui::FontId::proportional(48.0),
                    Palette::with_opacity(palette.foreground, 0.6),
                );
            }
            if response.clicked() {
                actions.push(if index == 0 { Action::Previous } else { Action::Next });
            }
        }
    }

    fn draw_scroll(&mut self, ui: &mut egui::Ui, palette: &Palette, actions: &mut Vec<Action>) {
        let pages = self.viewer.view().pages.clone();
        let target = self.viewer.view_mut().scroll_target.take();
        let ctx = ui.ctx().clone();
        let images = &mut self.images;

        let mut centers = Vec::with_capacity(pages.len());
        let mut viewport_center = 0.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let clip = ui.clip_rect();
                viewport_center = clip.center().y;
                let width = (ui.available_width() - SLIDE_MARGIN * 2.0).max(1.0);
                // Load one screen ahead in each direction.
                let preload = clip.expand2(egui::vec2(0.0, clip.height()));

                for (index, src) in pages.iter().enumerate() {
                    let page = index + 1;
                    let aspect = images
                        .texture(src)
                        .map(|t| {
                            let size = t.size_vec2();
                            size.y / size.x.max(1.0)
                        })
                        .unwrap_or(SLIDE_ASPECT);
                    ui.add_space(PAGE_GAP);
                    let (rect, _) = ui.allocate_exact_size(
                        egui::vec2(ui.available_width(), width * aspect),
                        egui::Sense::hover(),
                    );
                    let slide = egui::Rect::from_center_size(
                        rect.center(),
                        egui::vec2(width, width * aspect),
                    );

                    if slide.intersects(preload) {
                        images.request(&ctx, src);
                    }
                    match images.texture(src) {
                        Some(texture) => {
                            ui.painter()
                                .image(texture.id(), slide, full_uv(), egui::Color32::WHITE);
                        }
                        None => {
                            ui.painter().rect_filled(slide, 4.0, palette.surface);
                            ui.painter().text(
                                slide.center(),
                                egui::Align2::CENTER_CENTER,
                                page.to_string(),
                                egui::FontId::proportional(24.0),
                                palette.muted,
                            );
                        }
                    }
                    centers.push((page, rect.center().y));
                    if target == Some(page) {
                        ui.scroll_to_rect(rect, Some(egui::Align::Center));
                    }
                }
                ui.add_space(PAGE_GAP);
            });

        // The frame that issues a programmatic scroll still shows the old position.
        if target.is_none() {
            actions.push(Action::Scrolled(centers, viewport_center));
        }
    }

    fn draw_progress(&mut self, ui: &mut egui::Ui, palette: &Palette, actions: &mut Vec<Action>) {
        let rect = ui.max_rect();
        let ctx = ui.ctx().clone();
        let view = self.viewer.view();

        let bar = egui::Rect::from_min_max(
            egui::pos2(rect.left(), rect.bottom() - PROGRESS_HEIGHT),
            rect.right_bottom(),
        );
        ui.painter().rect_filled(bar, 0.0, palette.surface);
        let filled = egui::Rect::from_min_size(
            bar.min,
            egui::vec2(bar.width() * view.progress / 100.0, bar.height()),
        );
        ui.painter().rect_filled(filled, 0.0, palette.accent);

        let hit = egui::Rect::from_min_max(
            egui::pos2(bar.left(), bar.top() - PROGRESS_HIT),
            bar.max,
        );
        let response = ui.interact(hit, ui.id().with("progress"), egui::Sense::click());
        match response.hover_pos() {
            Some(pos) => {
                let x = pos.x - bar.left();
                let fraction = (x / bar.width().max(1.0)).clamp(0.0, 1.0);
                actions.push(Action::ProgressHover(fraction, x));
                if response.clicked() {
                    actions.push(Action::ProgressClick(fraction));
                }
            }
            None if view.preview.is_some() => actions.push(Action::ProgressLeave),
            None => {}
        }

        let Some(preview) = &view.preview else { return };
        self.images.request(&ctx, &preview.src);
        let size = egui::vec2(PREVIEW_WIDTH, PREVIEW_WIDTH * SLIDE_ASPECT);
        let left = (bar.left() + preview.x - size.x / 2.0)
            .clamp(bar.left(), (bar.right() - size.x).max(bar.left()));
        let frame = egui::Rect::from_min_size(
            egui::pos2(left, hit.top() - size.y - 8.0),
            size,
        );
        ui.painter().rect_filled(frame.expand(2.0), 4.0, palette.surface);
        if let Some(texture) = self.images.texture(&preview.src) {
            ui.painter().image(
                texture.id(),
                fit_rect(texture.size_vec2(), frame),
                full_uv(),
                egui::Color32::WHITE,
            );
        }
        ui.painter().text(
            frame.center_bottom() + egui::vec2(0.0, -6.0),
            egui::Align2::CENTER_BOTTOM,
            preview.page.to_string(),
            egui::FontId::monospace(14.0),
            palette.foreground,
        );
    }

    fn draw_controls(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let view = self.viewer.view();
        if !view.controls_visible {
            return;
        }

        egui::Area::new(egui::Id::new("viewer-title"))
            .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(&view.title).strong());
            });

        egui::Area::new(egui::Id::new("viewer-controls"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if view.close_to_list && ui.button("✕ List").clicked() {
                        actions.push(Action::CloseToList);
                    }
                    if ui.button("Overview").clicked() {
                        actions.push(Action::OpenOverview);
                    }
                    let mode_label = match view.mode {
                        ViewerMode::Paged => "Scroll",
                        ViewerMode::Scroll => "Paged",
                    };
                    if ui.button(mode_label).clicked() {
                        actions.push(Action::ToggleMode);
                    }
                    if ui.button("Share").clicked() {
                        actions.push(Action::OpenShare);
                    }
                    let fullscreen_label = if view.fullscreen_icon {
                        "Exit fullscreen"
                    } else {
                        "Fullscreen"
                    };
                    if ui.button(fullscreen_label).clicked() {
                        actions.push(Action::ToggleFullscreen);
                    }
                    if self.theme.is_some() {
                        let theme_label = if self.is_dark() { "☀" } else { "☾" };
                        if ui.button(theme_label).clicked() {
                            actions.push(Action::ToggleTheme);
                        }
                    }
                });
            });
    }

    fn draw_overview(&mut self, ctx: &egui::Context, palette: &Palette, actions: &mut Vec<Action>) {
        let view = self.viewer.view();
        if !view.overview_open {
            return;
        }
        let images = &mut self.images;
        let mut open = true;
        egui::Window::new("Overview")
            .collapsible(false)
            .default_size([THUMB_WIDTH * 4.0 + 64.0, 600.0])
            .open(&mut open)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for entry in &view.overview {
                            let size = egui::vec2(THUMB_WIDTH, THUMB_WIDTH * SLIDE_ASPECT);
                            let (rect, response) =
                                ui.allocate_exact_size(size, egui::Sense::click());
                            if !ui.is_rect_visible(rect) {
                                continue;
                            }
                            images.request(ctx, &entry.thumbnail);
                            ui.painter().rect_filled(rect, 4.0, palette.surface);
                            if let Some(texture) = images.texture(&entry.thumbnail) {
                                ui.painter().image(
                                    texture.id(),
                                    fit_rect(texture.size_vec2(), rect),
                                    full_uv(),
                                    egui::Color32::WHITE,
                                );
                            }
                            if entry.page == view.overview_current {
                                ui.painter().rect_stroke(
                                    rect,
                                    4.0,
                                    egui::Stroke::new(3.0, palette.accent),
                                    egui::StrokeKind::Outside,
                                );
                            } else if response.hovered() {
                                ui.painter().rect_stroke(
                                    rect.expand(2.0),
                                    4.0,
                                    egui::Stroke::new(
                                        2.0,
                                        Palette::with_opacity(palette.accent, 0.5),
                                    ),
                                    egui::StrokeKind::Outside,
                                );
                            }
                            ui.painter().text(
                                rect.left_bottom() + egui::vec2(6.0, -6.0),
                                egui::Align2::LEFT_BOTTOM,
                                entry.page.to_string(),
                                egui::FontId::monospace(14.0),
                                palette.foreground,
                            );
                            if response.clicked() {
                                actions.push(Action::SelectOverview(entry.page));
                            }
                        }
                    });
                });
            });
        if !open {
            actions.push(Action::CloseModal(Modal::Overview));
        }
    }

    fn draw_share(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let view = self.viewer.view();
        let Some(links) = &view.share else { return };
        let current_mode = self.viewer.share_mode();
        let mut mode = current_mode;
        let mut open = true;
        let copy_label = |target: CopyTarget| {
            if view.copied == Some(target) { "Copied!" } else { "Copy" }
        };

        egui::Window::new("Share")
            .collapsible(false)
            .resizable(false)
            .default_width(480.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Open in:");
                    ui.radio_value(&mut mode, ViewerMode::Paged, "Paged");
                    ui.radio_value(&mut mode, ViewerMode::Scroll, "Scroll");
                });
                ui.separator();
                ui.label("Link");
                ui.horizontal(|ui| {
                    ui.code(links.url.as_str());
                    if ui.button(copy_label(CopyTarget::Url)).clicked() {
                        actions.push(Action::Copy(CopyTarget::Url));
                    }
                });
                ui.add_space(8.0);
                ui.label("Embed");
                ui.add(egui::Label::new(egui::RichText::new(&links.embed).code()).wrap());
                if ui.button(copy_label(CopyTarget::Embed)).clicked() {
                    actions.push(Action::Copy(CopyTarget::Embed));
                }
            });

        if mode != current_mode {
            actions.push(Action::ShareMode(mode));
        }
        if !open {
            actions.push(Action::CloseModal(Modal::Share));
        }
    }

    fn draw_alert(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(message) = &self.viewer.view().alert else { return };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    actions.push(Action::DismissAlert);
                }
            });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.sync_theme(ctx);
        self.load_slots(ctx);

        let mut actions = self.read_input(ctx, now);
        let palette = self.palette();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(palette.background).inner_margin(0.0))
            .show(ctx, |ui| {
                match self.viewer.view().mode {
                    ViewerMode::Paged => self.draw_paged(ui, &palette, &mut actions),
                    ViewerMode::Scroll => self.draw_scroll(ui, &palette, &mut actions),
                }
                self.draw_progress(ui, &palette, &mut actions);
            });
        self.draw_controls(ctx, &mut actions);
        self.draw_overview(ctx, &palette, &mut actions);
        self.draw_share(ctx, &mut actions);
        self.draw_alert(ctx, &mut actions);

        for action in actions {
            self.apply(action, now);
        }
        self.viewer.tick(Instant::now());
        self.flush(ctx);

        if let Some(deadline) = self.viewer.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}

fn full_uv() -> egui::Rect {
    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
}

/// Largest rect with `size`'s aspect ratio centered inside `area`.
fn fit_rect(size: egui::Vec2, area: egui::Rect) -> egui::Rect {
    if size.x <= 0.0 || size.y <= 0.0 {
        return area;
    }
    let scale = (area.width() / size.x).min(area.height() / size.y);
    egui::Rect::from_center_size(area.center(), size * scale)
}
