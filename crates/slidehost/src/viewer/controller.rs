use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use thiserror::Error;
use url::Url;

use super::location::{self, FROM_PARAM, MODE_PARAM, PAGE_PARAM};
use super::share::{self, CopyTarget, ShareLinks};
use super::state::{self, Navigator, SlotRing, SlotRole};
use crate::api::{ApiError, DeckSource};
use crate::model::ViewerMode;
use crate::timer::{self, Timer};

/// Minimum spacing between two wheel-driven page changes.
pub const WHEEL_THROTTLE: Duration = Duration::from_millis(300);
/// Pointer inactivity after which the chrome controls hide.
pub const CONTROLS_HIDE_DELAY: Duration = Duration::from_secs(3);
/// How long the "copied" feedback stays on.
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no deck name in {0}")]
    MissingDeck(Url),

    #[error("deck {0} has no pages")]
    EmptyDeck(String),

    #[error("failed to load deck metadata: {0}")]
    Api(#[from] ApiError),

    #[error("invalid deck URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Clipboard or fullscreen capability missing.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("{0} is not available")]
    Unavailable(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Space,
    Home,
    End,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Overview,
    Share,
}

/// Floating thumbnail above the progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub page: usize,
    pub src: String,
    /// Horizontal offset of the cursor within the bar.
    pub x: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewEntry {
    pub page: usize,
    pub thumbnail: String,
}

/// Everything the viewer page draws or asks the platform for.
pub trait ViewerView {
    fn set_slot(&mut self, slot: usize, role: SlotRole, src: Option<&str>);
    fn set_progress(&mut self, percent: f32);
    fn set_nav_visibility(&mut self, previous: bool, next: bool);
    fn set_title(&mut self, title: &str);
    /// History replacement, not a new entry.
    fn replace_url(&mut self, url: &Url);
    fn set_loading(&mut self, loading: bool);
    /// Switch layouts; `pages` lists every image in scroll mode and is empty in paged mode.
    fn set_mode(&mut self, mode: ViewerMode, pages: &[String]);
    fn scroll_to_page(&mut self, page: usize);
    fn show_preview(&mut self, preview: Option<&Preview>);
    fn build_overview(&mut self, entries: &[OverviewEntry]);
    fn show_overview(&mut self, open: bool, current: usize);
    fn show_share(&mut self, links: Option<&ShareLinks>);
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), EnvError>;
    fn show_copied(&mut self, target: Option<CopyTarget>);
    fn alert(&mut self, message: &str);
    fn request_fullscreen(&mut self, on: bool) -> Result<(), EnvError>;
    fn set_fullscreen_icon(&mut self, fullscreen: bool);
    fn set_controls_visible(&mut self, visible: bool);
    fn show_close_to_list(&mut self, visible: bool);
    fn navigate(&mut self, url: &Url);
}

#[derive(Debug, Clone, Copy)]
pub struct ViewerOptions {
    pub viewport_width: f32,
    pub narrow_width: f32,
    /// Mode used when neither the URL nor the viewport width forces scroll mode.
    pub default_mode: ViewerMode,
}

/// Page-by-page and continuous-scroll presentation of one deck.
///
/// Paged mode keeps its page in `nav`; scroll mode tracks `scroll_page`
/// separately and commits it when switching back.
pub struct ViewerController<V> {
    view: V,
    name: String,
    title: String,
    base: Url,
    location: Url,
    urls: Vec<String>,
    nav: Navigator,
    scroll_page: usize,
    mode: ViewerMode,
    slots: SlotRing,
    loading: BTreeSet<usize>,
    from_list: bool,
    modals: Vec<Modal>,
    overview_built: bool,
    share_mode: ViewerMode,
    last_wheel: Option<Instant>,
    controls_visible: bool,
    controls_timer: Timer,
    copied_timer: Timer,
    fullscreen: bool,
}

impl<V: ViewerView> ViewerController<V> {
    pub fn open(
        view: V,
        source: &impl DeckSource,
        location: Url,
        options: ViewerOptions,
        now: Instant,
    ) -> Result<Self, OpenError> {
        let name = location::deck_name(&location)
            .ok_or_else(|| OpenError::MissingDeck(location.clone()))?;
        let base = location::resource_base(&location);
        let meta = source.fetch_metadata(&location::metadata_url(&base, &name)?)?;
        if meta.page_count == 0 {
            return Err(OpenError::EmptyDeck(name));
        }
        let urls = location::image_urls(&base, &name, &meta)?;
        tracing::debug!(deck = %name, pages = meta.page_count, "deck metadata loaded");

        let page = state::parse_page(
            location::query_param(&location, PAGE_PARAM).as_deref(),
            meta.page_count,
        );
        let forced_scroll =
            location::query_param(&location, MODE_PARAM).as_deref() == Some("scroll");
        let mode = if forced_scroll || options.viewport_width < options.narrow_width {
            ViewerMode::Scroll
        } else {
            options.default_mode
        };
        let from_list = location::query_param(&location, FROM_PARAM).as_deref() == Some("list");

        let mut controller = Self {
            view,
            title: meta.display_title().to_string(),
            name,
            base,
            location,
            urls,
            nav: Navigator::new(meta.page_count, page),
            scroll_page: page,
            mode,
            slots: SlotRing::default(),
            loading: BTreeSet::new(),
            from_list,
            modals: Vec::new(),
            overview_built: false,
            share_mode: ViewerMode::Paged,
            last_wheel: None,
            controls_visible: true,
            controls_timer: Timer::default(),
            copied_timer: Timer::default(),
            fullscreen: false,
        };
        controller.render_initial(now);
        Ok(controller)
    }

    fn render_initial(&mut self, now: Instant) {
        self.view.show_close_to_list(self.from_list);
        self.view.set_fullscreen_icon(false);
        self.view.set_controls_visible(true);
        self.controls_timer.restart(now, CONTROLS_HIDE_DELAY);
        match self.mode {
            ViewerMode::Paged => {
                self.view.set_mode(ViewerMode::Paged, &[]);
                self.show_slots();
            }
            ViewerMode::Scroll => {
                self.view.set_mode(ViewerMode::Scroll, &self.urls);
                self.view.scroll_to_page(self.scroll_page);
            }
        }
        self.sync();
    }

    /// Page shown by the active mode.
    pub fn current_slide(&self) -> usize {
        match self.mode {
            ViewerMode::Paged => self.nav.current(),
            ViewerMode::Scroll => self.scroll_page,
        }
    }

    pub fn total_slides(&self) -> usize {
        self.nav.total()
    }

    fn show_slots(&mut self) {
        let updates = self.slots.show(self.nav.current(), self.nav.total());
        for update in updates {
            let src = update.page.map(|p| self.urls[p - 1].as_str());
            self.view.set_slot(update.slot, update.role, src);
            if update.changed {
                if update.page.is_some() {
                    self.loading.insert(update.slot);
                } else {
                    self.loading.remove(&update.slot);
                }
            }
        }
        self.refresh_loading();
    }

    fn refresh_loading(&mut self) {
        let current = self.slots.current_slot();
        self.view.set_loading(self.loading.contains(&current));
    }

    /// Host report that a slot's image finished loading or failed.
    pub fn on_image_settled(&mut self, slot: usize) {
        if self.loading.remove(&slot) && self.mode == ViewerMode::Paged {
            self.refresh_loading();
        }
    }

    /// Mirror the active page into progress, nav areas, title and URL.
    fn sync(&mut self) {
        let page = self.current_slide();
        let total = self.nav.total();
        self.view.set_progress(state::progress_percent(page, total));
        self.view.set_nav_visibility(page > 1, page < total);
        self.view.set_title(&format!("{} ({page}/{total})", self.title));
        self.location =
            location::with_query_param(&self.location, PAGE_PARAM, Some(&page.to_string()));
        self.view.replace_url(&self.location);
    }

    /// Go to `page`; out-of-range targets are a no-op.
    pub fn go_to(&mut self, page: usize) -> bool {
        match self.mode {
            ViewerMode::Paged => {
                if !self.nav.go_to(page) {
                    return false;
                }
                tracing::debug!(page, "paged navigation");
                self.show_slots();
            }
            ViewerMode::Scroll => {
                if page < 1 || page > self.nav.total() || page == self.scroll_page {
                    return false;
                }
                self.scroll_page = page;
                self.view.scroll_to_page(page);
            }
        }
        self.sync();
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_slide() + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_slide().checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn first(&mut self) -> bool {
        self.go_to(1)
    }

    pub fn last(&mut self) -> bool {
        self.go_to(self.nav.total())
    }

    fn accepts_paging_input(&self) -> bool {
        self.mode == ViewerMode::Paged && self.modals.is_empty()
    }

    /// Returns whether the key was consumed.
    pub fn on_key(&mut self, key: Key) -> bool {
        if key == Key::Escape {
            return self.close_top_modal();
        }
        if !self.accepts_paging_input() {
            return false;
        }
        match key {
            Key::ArrowLeft | Key::ArrowUp | Key::PageUp => self.previous(),
            Key::ArrowRight | Key::ArrowDown | Key::PageDown | Key::Space => self.next(),
            Key::Home => self.first(),
            Key::End => self.last(),
            Key::Escape => false,
        }
    }

    /// Positive `delta_y` moves forward. One navigation per throttle window.
    pub fn on_wheel(&mut self, delta_y: f32, now: Instant) -> bool {
        if !self.accepts_paging_input() || delta_y == 0.0 {
            return false;
        }
        if let Some(last) = self.last_wheel {
            if now.saturating_duration_since(last) < WHEEL_THROTTLE {
                return false;
            }
        }
        self.last_wheel = Some(now);
        if delta_y > 0.0 {
            self.next()
        } else {
            self.previous()
        }
    }

    /// Click on the progress bar at `fraction` of its width.
    pub fn on_progress_click(&mut self, fraction: f32) -> bool {
        self.go_to(state::page_at_fraction(fraction, self.nav.total()))
    }

    pub fn on_progress_hover(&mut self, fraction: f32, x: f32) {
        let page = state::page_at_fraction(fraction, self.nav.total());
        let preview = Preview {
            page,
            src: self.urls[page - 1].clone(),
            x,
        };
        self.view.show_preview(Some(&preview));
    }

    pub fn on_progress_leave(&mut self) {
        self.view.show_preview(None);
    }

    /// Scroll mode: `centers` are `(page, vertical center)` of rendered pages.
    pub fn on_scroll(&mut self, centers: &[(usize, f32)], viewport_center: f32) {
        if self.mode != ViewerMode::Scroll {
            return;
        }
        let Some(page) = state::nearest_page(centers, viewport_center) else {
            return;
        };
        if page != self.scroll_page && (1..=self.nav.total()).contains(&page) {
            self.scroll_page = page;
            self.sync();
        }
    }

    pub fn set_mode(&mut self, mode: ViewerMode) {
        if mode == self.mode {
            return;
        }
        tracing::debug!(from = self.mode.name(), to = mode.name(), "viewer mode change");
        self.view.show_preview(None);
        match mode {
            ViewerMode::Scroll => {
                self.scroll_page = self.nav.current();
                self.mode = ViewerMode::Scroll;
                self.view.set_mode(ViewerMode::Scroll, &self.urls);
                self.view.scroll_to_page(self.scroll_page);
                self.view.set_loading(false);
            }
            ViewerMode::Paged => {
                self.nav = Navigator::new(self.nav.total(), self.scroll_page);
                self.mode = ViewerMode::Paged;
                self.view.set_mode(ViewerMode::Paged, &[]);
                self.slots.reset();
                self.loading.clear();
                self.show_slots();
            }
        }
        self.sync();
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            ViewerMode::Paged => ViewerMode::Scroll,
            ViewerMode::Scroll => ViewerMode::Paged,
        };
        self.set_mode(next);
    }

    pub fn open_overview(&mut self) {
        if self.modals.contains(&Modal::Overview) {
            return;
        }
        if !self.overview_built {
            let entries: Vec<OverviewEntry> = self
                .urls
                .iter()
                .enumerate()
                .map(|(i, src)| OverviewEntry {
                    page: i + 1,
                    thumbnail: src.clone(),
                })
                .collect();
            self.view.build_overview(&entries);
            self.overview_built = true;
        }
        self.modals.push(Modal::Overview);
        self.view.show_overview(true, self.current_slide());
    }

    /// Click on an overview entry.
    pub fn select_overview(&mut self, page: usize) {
        self.close_modal(Modal::Overview);
        self.go_to(page);
    }

    pub fn open_share(&mut self) {
        if !self.modals.contains(&Modal::Share) {
            self.modals.push(Modal::Share);
        }
        let links = self.share_links();
        self.view.show_share(Some(&links));
    }

    pub fn set_share_mode(&mut self, mode: ViewerMode) {
        self.share_mode = mode;
        if self.modals.contains(&Modal::Share) {
            let links = self.share_links();
            self.view.show_share(Some(&links));
        }
    }

    pub fn share_mode(&self) -> ViewerMode {
        self.share_mode
    }

    pub fn share_links(&self) -> ShareLinks {
        share::share_links(&self.location, self.share_mode, &self.title)
    }

    pub fn copy_share(&mut self, target: CopyTarget, now: Instant) -> bool {
        let links = self.share_links();
        let text = match target {
            CopyTarget::Url => links.url.to_string(),
            CopyTarget::Embed => links.embed,
        };
        match self.view.copy_to_clipboard(&text) {
            Ok(()) => {
                self.view.show_copied(Some(target));
                self.copied_timer.restart(now, COPIED_FEEDBACK);
                true
            }
            Err(e) => {
                tracing::warn!("clipboard write failed: {e}");
                self.view.alert(&format!("Could not copy to the clipboard: {e}"));
                false
            }
        }
    }

    /// Closes the topmost modal. Returns false when none was open.
    pub fn close_top_modal(&mut self) -> bool {
        match self.modals.last().copied() {
            Some(modal) => {
                self.close_modal(modal);
                true
            }
            None => false,
        }
    }

    pub fn close_modal(&mut self, modal: Modal) {
        let before = self.modals.len();
        self.modals.retain(|m| *m != modal);
        if self.modals.len() == before {
            return;
        }
        match modal {
            Modal::Overview => self.view.show_overview(false, self.current_slide()),
            Modal::Share => self.view.show_share(None),
        }
    }

    pub fn is_modal_open(&self) -> bool {
        !self.modals.is_empty()
    }

    pub fn top_modal(&self) -> Option<Modal> {
        self.modals.last().copied()
    }

    pub fn toggle_fullscreen(&mut self) {
        if let Err(e) = self.view.request_fullscreen(!self.fullscreen) {
            tracing::warn!("fullscreen request failed: {e}");
            self.view.alert(&format!("Fullscreen is unavailable: {e}"));
        }
    }

    /// Host report of an actual fullscreen change, whatever triggered it.
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        if self.fullscreen != fullscreen {
            self.fullscreen = fullscreen;
            self.view.set_fullscreen_icon(fullscreen);
        }
    }

    pub fn on_pointer_move(&mut self, now: Instant) {
        if !self.controls_visible {
            self.controls_visible = true;
            self.view.set_controls_visible(true);
        }
        self.controls_timer.restart(now, CONTROLS_HIDE_DELAY);
    }

    /// Returns to the listing when the viewer was opened from it.
    pub fn close_to_list(&mut self) -> bool {
        if !self.from_list {
            return false;
        }
        self.view.navigate(&self.base);
        true
    }

    pub fn tick(&mut self, now: Instant) {
        if self.controls_timer.fire(now) && self.controls_visible {
            self.controls_visible = false;
            self.view.set_controls_visible(false);
        }
        if self.copied_timer.fire(now) {
            self.view.show_copied(None);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        timer::next_deadline(&[&self.controls_timer, &self.copied_timer])
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeckMetadata;
    use std::cell::RefCell;

    struct FakeSource {
        meta: DeckMetadata,
        requested: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new(page_count: usize) -> Self {
            Self {
                meta: DeckMetadata {
                    name: "demo".into(),
                    title: Some("Demo".into()),
                    page_count,
                    format: Some("png".into()),
                },
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl DeckSource for FakeSource {
        fn fetch_metadata(&self, url: &Url) -> Result<DeckMetadata, ApiError> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(self.meta.clone())
        }

        fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingView {
        slots: [Option<String>; 3],
        roles: [Option<SlotRole>; 3],
        progress: f32,
        nav: (bool, bool),
        title: String,
        url: Option<Url>,
        url_updates: usize,
        loading: bool,
        mode: Option<ViewerMode>,
        scroll_pages: usize,
        scrolled_to: Option<usize>,
        preview: Option<Preview>,
        overview_builds: usize,
        overview_open: bool,
        share: Option<ShareLinks>,
        clipboard: Option<String>,
        clipboard_broken: bool,
        copied: Option<CopyTarget>,
        alerts: Vec<String>,
        fullscreen_requests: Vec<bool>,
        fullscreen_icon: bool,
        controls_visible: bool,
        close_to_list: bool,
        navigated: Option<Url>,
    }

    impl ViewerView for RecordingView {
        fn set_slot(&mut self, slot: usize, role: SlotRole, src: Option<&str>) {
            self.slots[slot] = src.map(str::to_string);
            self.roles[slot] = Some(role);
        }

        fn set_progress(&mut self, percent: f32) {
            self.progress = percent;
        }

        fn set_nav_visibility(&mut self, previous: bool, next: bool) {
            self.nav = (previous, next);
        }

        fn set_title(&mut self, title: &str) {
            self.title = title.to_string();
        }

        fn replace_url(&mut self, url: &Url) {
            self.url = Some(url.clone());
            self.url_updates += 1;
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading = loading;
        }

        fn set_mode(&mut self, mode: ViewerMode, pages: &[String]) {
            self.mode = Some(mode);
            self.scroll_pages = pages.len();
        }

        fn scroll_to_page(&mut self, page: usize) {
            self.scrolled_to = Some(page);
        }

        fn show_preview(&mut self, preview: Option<&Preview>) {
            self.preview = preview.cloned();
        }

        fn build_overview(&mut self, _entries: &[OverviewEntry]) {
            self.overview_builds += 1;
        }

        fn show_overview(&mut self, open: bool, _current: usize) {
            self.overview_open = open;
        }

        fn show_share(&mut self, links: Option<&ShareLinks>) {
            self.share = links.cloned();
        }

        fn copy_to_clipboard(&mut self, text: &str) -> Result<(), EnvError> {
            if self.clipboard_broken {
                return Err(EnvError::Unavailable("clipboard"));
            }
            self.clipboard = Some(text.to_string());
            Ok(())
        }

        fn show_copied(&mut self, target: Option<CopyTarget>) {
            self.copied = target;
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn request_fullscreen(&mut self, on: bool) -> Result<(), EnvError> {
            self.fullscreen_requests.push(on);
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
            self.navigated = Some(url.clone());
        }
    }

    const WIDE: ViewerOptions = ViewerOptions {
        viewport_width: 1280.0,
        narrow_width: 768.0,
        default_mode: ViewerMode::Paged,
    };

    fn open_at(url: &str, pages: usize, options: ViewerOptions) -> ViewerController<RecordingView> {
        let source = FakeSource::new(pages);
        ViewerController::open(
            RecordingView::default(),
            &source,
            Url::parse(url).unwrap(),
            options,
            Instant::now(),
        )
        .unwrap()
    }

    fn open(pages: usize) -> ViewerController<RecordingView> {
        open_at("https://h.example/demo", pages, WIDE)
    }

    fn url_page(c: &ViewerController<RecordingView>) -> Option<String> {
        location::query_param(c.view().url.as_ref().unwrap(), PAGE_PARAM)
    }

    #[test]
    fn test_open_defaults_to_page_one_and_rewrites_url() {
        let source = FakeSource::new(5);
        let c = ViewerController::open(
            RecordingView::default(),
            &source,
            Url::parse("https://h.example/demo").unwrap(),
            WIDE,
            Instant::now(),
        )
        .unwrap();

        assert_eq!(
            *source.requested.borrow(),
            vec!["https://h.example/slides/demo/metadata.json"]
        );
        assert_eq!(c.total_slides(), 5);
        assert_eq!(c.current_slide(), 1);
        assert_eq!(url_page(&c).as_deref(), Some("1"));
        assert_eq!(c.view().title, "Demo (1/5)");
        assert_eq!(c.view().nav, (false, true));
        assert_eq!(c.view().mode, Some(ViewerMode::Paged));
        assert!(c.view().loading);
    }

    #[test]
    fn test_images_follow_deck_name_from_location() {
        let mut source = FakeSource::new(3);
        source.meta.name = "Demo deck".into();
        let c = ViewerController::open(
            RecordingView::default(),
            &source,
            Url::parse("https://h.example/viewer.html?slide=demo").unwrap(),
            WIDE,
            Instant::now(),
        )
        .unwrap();
        let first = "https://h.example/slides/demo/images/slide-001.png";
        assert!(c.view().slots.iter().flatten().any(|src| src == first));
    }

    #[test]
    fn test_open_rejects_missing_and_empty_decks() {
        let source = FakeSource::new(0);
        let err = ViewerController::open(
            RecordingView::default(),
            &source,
            Url::parse("https://h.example/demo").unwrap(),
            WIDE,
            Instant::now(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, OpenError::EmptyDeck(_)));

        let err = ViewerController::open(
            RecordingView::default(),
            &FakeSource::new(3),
            Url::parse("https://h.example/").unwrap(),
            WIDE,
            Instant::now(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, OpenError::MissingDeck(_)));
    }

    #[test]
    fn test_initial_page_is_clamped() {
        let c = open_at("https://h.example/demo?page=99", 4, WIDE);
        assert_eq!(c.current_slide(), 4);
        assert_eq!(url_page(&c).as_deref(), Some("4"));
        assert_eq!(c.view().nav, (true, false));
    }

    #[test]
    fn test_every_page_syncs_progress_and_url() {
        let mut c = open(7);
        for n in 1..=7 {
            c.go_to(n);
            assert_eq!(c.current_slide(), n);
            assert!((c.view().progress - n as f32 / 7.0 * 100.0).abs() < 1e-4);
            assert_eq!(url_page(&c), Some(n.to_string()));
        }
    }

    #[test]
    fn test_navigation_past_edges_is_noop() {
        let mut c = open(3);
        assert!(!c.previous());
        assert!(!c.go_to(0));
        c.last();
        assert!(!c.next());
        assert!(!c.go_to(4));
        assert_eq!(c.current_slide(), 3);
    }

    #[test]
    fn test_slots_follow_navigation() {
        let mut c = open(3);
        c.next();
        let current = c
            .view()
            .roles
            .iter()
            .position(|r| *r == Some(SlotRole::Current))
            .unwrap();
        assert!(c.view().slots[current]
            .as_deref()
            .unwrap()
            .ends_with("slide-002.png"));
        let slots: Vec<String> = c.view().slots.iter().flatten().cloned().collect();
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_loading_clears_when_current_image_settles() {
        let mut c = open(3);
        assert!(c.view().loading);
        c.on_image_settled(0);
        assert!(!c.view().loading);
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut c = open(10);
        assert!(c.on_key(Key::ArrowRight));
        assert!(c.on_key(Key::Space));
        assert!(c.on_key(Key::PageDown));
        assert_eq!(c.current_slide(), 4);
        assert!(c.on_key(Key::ArrowLeft));
        assert_eq!(c.current_slide(), 3);
        c.on_key(Key::End);
        assert_eq!(c.current_slide(), 10);
        c.on_key(Key::Home);
        assert_eq!(c.current_slide(), 1);
    }

    #[test]
    fn test_keys_suppressed_while_modal_open_and_escape_closes() {
        let mut c = open(5);
        c.open_overview();
        c.open_share();
        assert!(!c.on_key(Key::ArrowRight));
        assert_eq!(c.current_slide(), 1);

        assert!(c.on_key(Key::Escape));
        assert_eq!(c.top_modal(), Some(Modal::Overview));
        assert!(c.view().share.is_none());
        assert!(c.on_key(Key::Escape));
        assert!(!c.view().overview_open);
        assert!(!c.on_key(Key::Escape));
        assert!(c.on_key(Key::ArrowRight));
    }

    #[test]
    fn test_wheel_ignored_while_modal_open() {
        let mut c = open(5);
        c.open_overview();
        assert!(!c.on_wheel(40.0, Instant::now()));
        assert_eq!(c.current_slide(), 1);
        assert_eq!(c.view().title, "Demo (1/5)");
    }

    #[test]
    fn test_wheel_is_throttled() {
        let mut c = open(10);
        let start = Instant::now();
        assert!(c.on_wheel(40.0, start));
        assert!(!c.on_wheel(40.0, start + Duration::from_millis(100)));
        assert!(!c.on_wheel(40.0, start + Duration::from_millis(299)));
        assert!(c.on_wheel(-40.0, start + Duration::from_millis(300)));
        assert_eq!(c.current_slide(), 1);
        assert!(!c.on_wheel(0.0, start + Duration::from_secs(5)));
    }

    #[test]
    fn test_progress_click_maps_fraction_to_page() {
        let mut c = open(10);
        c.on_progress_click(0.42);
        assert_eq!(c.current_slide(), 5);
        c.on_progress_click(1.3);
        assert_eq!(c.current_slide(), 10);
        c.on_progress_click(0.0);
        assert_eq!(c.current_slide(), 1);
    }

    #[test]
    fn test_progress_hover_preview() {
        let mut c = open(10);
        c.on_progress_hover(0.25, 120.0);
        let preview = c.view().preview.clone().unwrap();
        assert_eq!(preview.page, 3);
        assert_eq!(preview.x, 120.0);
        assert!(preview.src.ends_with("slide-003.png"));
        c.on_progress_leave();
        assert!(c.view().preview.is_none());
    }

    #[test]
    fn test_overview_built_once_and_selection_navigates() {
        let mut c = open(6);
        c.open_overview();
        c.close_top_modal();
        c.open_overview();
        assert_eq!(c.view().overview_builds, 1);
        c.select_overview(4);
        assert_eq!(c.current_slide(), 4);
        assert!(!c.view().overview_open);
        assert!(!c.is_modal_open());
    }

    #[test]
    fn test_narrow_viewport_or_url_starts_in_scroll_mode() {
        let narrow = ViewerOptions {
            viewport_width: 500.0,
            ..WIDE
        };
        let c = open_at("https://h.example/demo?page=3", 5, narrow);
        assert_eq!(c.mode(), ViewerMode::Scroll);
        assert_eq!(c.view().scroll_pages, 5);
        assert_eq!(c.view().scrolled_to, Some(3));

        let c = open_at("https://h.example/demo?mode=scroll", 5, WIDE);
        assert_eq!(c.mode(), ViewerMode::Scroll);
    }

    #[test]
    fn test_scroll_mode_tracks_center_and_commits_on_return() {
        let mut c = open(5);
        c.go_to(2);
        c.set_mode(ViewerMode::Scroll);
        assert_eq!(c.view().scrolled_to, Some(2));

        assert!(!c.on_key(Key::ArrowRight));
        assert!(!c.on_wheel(10.0, Instant::now()));

        let centers = [(1, 100.0), (2, 700.0), (3, 1300.0), (4, 1900.0)];
        c.on_scroll(&centers, 1850.0);
        assert_eq!(c.current_slide(), 4);
        assert_eq!(url_page(&c).as_deref(), Some("4"));

        c.set_mode(ViewerMode::Paged);
        assert_eq!(c.current_slide(), 4);
        assert_eq!(c.view().mode, Some(ViewerMode::Paged));
        assert_eq!(c.view().title, "Demo (4/5)");
    }

    #[test]
    fn test_share_links_follow_share_mode() {
        let mut c = open_at("https://h.example/demo?from=list", 5, WIDE);
        c.go_to(2);
        c.open_share();
        let links = c.view().share.clone().unwrap();
        assert_eq!(links.url.as_str(), "https://h.example/demo?page=2");

        c.set_share_mode(ViewerMode::Scroll);
        let links = c.view().share.clone().unwrap();
        assert_eq!(links.url.as_str(), "https://h.example/demo?page=2&mode=scroll");
        assert!(links.embed.contains("mode=scroll"));
    }

    #[test]
    fn test_copy_feedback_is_transient() {
        let mut c = open(3);
        let now = Instant::now();
        assert!(c.copy_share(CopyTarget::Url, now));
        assert_eq!(c.view().clipboard.as_deref(), Some("https://h.example/demo?page=1"));
        assert_eq!(c.view().copied, Some(CopyTarget::Url));
        c.tick(now + COPIED_FEEDBACK);
        assert_eq!(c.view().copied, None);
    }

    #[test]
    fn test_clipboard_failure_alerts() {
        let mut c = open(3);
        c.view_mut().clipboard_broken = true;
        assert!(!c.copy_share(CopyTarget::Embed, Instant::now()));
        assert_eq!(c.view().alerts.len(), 1);
        assert_eq!(c.view().copied, None);
    }

    #[test]
    fn test_fullscreen_icon_follows_change_events() {
        let mut c = open(3);
        c.toggle_fullscreen();
        assert_eq!(c.view().fullscreen_requests, vec![true]);
        assert!(!c.view().fullscreen_icon);
        c.on_fullscreen_change(true);
        assert!(c.view().fullscreen_icon);
        c.toggle_fullscreen();
        assert_eq!(c.view().fullscreen_requests, vec![true, false]);
        c.on_fullscreen_change(false);
        assert!(!c.view().fullscreen_icon);
    }

    #[test]
    fn test_controls_hide_after_inactivity_and_reset_on_move() {
        let start = Instant::now();
        let source = FakeSource::new(3);
        let mut c = ViewerController::open(
            RecordingView::default(),
            &source,
            Url::parse("https://h.example/demo").unwrap(),
            WIDE,
            start,
        )
        .unwrap();
        assert!(c.view().controls_visible);

        c.on_pointer_move(start + Duration::from_secs(2));
        c.tick(start + Duration::from_secs(4));
        assert!(c.view().controls_visible);
        c.tick(start + Duration::from_secs(5));
        assert!(!c.view().controls_visible);

        c.on_pointer_move(start + Duration::from_secs(6));
        assert!(c.view().controls_visible);
    }

    #[test]
    fn test_close_to_list_only_when_opened_from_list() {
        let mut c = open(3);
        assert!(!c.view().close_to_list);
        assert!(!c.close_to_list());

        let mut c = open_at("https://h.example/site/demo?from=list", 3, WIDE);
        assert!(c.view().close_to_list);
        assert!(c.close_to_list());
        assert_eq!(
            c.view().navigated.as_ref().map(Url::as_str),
            Some("https://h.example/site/")
        );
    }
}
