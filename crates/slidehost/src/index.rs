use std::collections::HashSet;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crate::api::{ApiError, SlideApi};
use crate::busy::{BusySlot, Operation};
use crate::live_reload::{ChannelEvent, LiveReloadMessage};
use crate::model::{ImportForm, SlidePatch, SlideSummary};
use crate::timer::{self, Timer};

/// Wait before re-listing after a failed import, to catch imports that landed anyway.
pub const IMPORT_RECHECK_DELAY: Duration = Duration::from_millis(1500);
/// Settle time between a `reload` push and the page reload.
pub const RELOAD_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Fixed delay before reopening a failed live-reload channel. No growth, no cap.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Management API answered: import/edit/delete and live reload enabled.
    Dev,
    /// Read-only listing from pre-built data.
    Static,
}

/// Everything the listing page shows or asks the user.
pub trait IndexView {
    fn set_mode(&mut self, mode: IndexMode);
    fn render_slides(&mut self, slides: &[SlideSummary]);
    fn render_empty(&mut self);
    /// Blocking, user-visible error.
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
    fn set_import_busy(&mut self, busy: bool);
    fn close_import_dialog(&mut self);
    fn close_edit_dialog(&mut self);
    fn reload_page(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// Import failed; a reconciliation re-list is scheduled.
    Pending,
    Cancelled,
    Failed,
    /// Not attempted: static mode, or another operation holds the busy slot.
    Rejected,
}

struct ImportCheck {
    known: HashSet<String>,
    error: String,
}

pub struct SlideIndexController<A, V> {
    api: A,
    view: V,
    embedded: Option<Vec<SlideSummary>>,
    mode: IndexMode,
    slides: Vec<SlideSummary>,
    busy: BusySlot,
    import_check: Option<ImportCheck>,
    recheck_timer: Timer,
    reload_timer: Timer,
    reconnect_timer: Timer,
    channel: Option<Receiver<ChannelEvent>>,
    live_reload: bool,
}

impl<A: SlideApi, V: IndexView> SlideIndexController<A, V> {
    /// `embedded` is the pre-built listing consulted first in static mode.
    pub fn new(api: A, view: V, embedded: Option<Vec<SlideSummary>>) -> Self {
        Self {
            api,
            view,
            embedded,
            mode: IndexMode::Static,
            slides: Vec::new(),
            busy: BusySlot::default(),
            import_check: None,
            recheck_timer: Timer::default(),
            reload_timer: Timer::default(),
            reconnect_timer: Timer::default(),
            channel: None,
            live_reload: false,
        }
    }

    /// Follow server pushes once dev mode is detected.
    pub fn with_live_reload(mut self) -> Self {
        self.live_reload = true;
        self
    }

    /// Probe the API, pick the mode, render the first listing.
    pub fn initialize(&mut self, now: Instant) {
        match self.api.list_slides() {
            Ok(slides) => {
                tracing::info!(count = slides.len(), "management API reachable, dev mode");
                self.mode = IndexMode::Dev;
                self.view.set_mode(self.mode);
                self.slides = slides;
                self.render();
                if self.live_reload && self.channel.is_none() {
                    self.open_channel(now);
                }
            }
            Err(e) => {
                tracing::info!("management API unavailable ({e}), static mode");
                self.mode = IndexMode::Static;
                self.view.set_mode(self.mode);
                self.slides = self.load_slides();
                self.render();
            }
        }
    }

    /// Current listing for the mode; failures degrade to an empty list.
    pub fn load_slides(&self) -> Vec<SlideSummary> {
        match self.fetch_slides() {
            Ok(slides) => slides,
            Err(e) => {
                tracing::warn!("listing unavailable: {e}");
                Vec::new()
            }
        }
    }

    fn fetch_slides(&self) -> Result<Vec<SlideSummary>, ApiError> {
        match self.mode {
            IndexMode::Dev => self.api.list_slides(),
            IndexMode::Static => {
                if let Some(embedded) = &self.embedded {
                    return Ok(embedded.clone());
                }
                self.api.static_index()
            }
        }
    }

    pub fn refresh(&mut self) {
        self.slides = self.load_slides();
        self.render();
    }

    fn render(&mut self) {
        if self.slides.is_empty() {
            self.view.render_empty();
        } else {
            self.view.render_slides(&self.slides);
        }
    }

    fn begin(&mut self, op: Operation) -> bool {
        if self.mode != IndexMode::Dev {
            self.view.alert(&format!(
                "Cannot {} slides: the management API is not available.",
                op.label()
            ));
            return false;
        }
        if let Err(held) = self.busy.try_acquire(op) {
            self.view.alert(&format!(
                "Cannot {} now: {} still in progress.",
                op.label(),
                held.label()
            ));
            return false;
        }
        true
    }

    pub fn import(&mut self, form: &ImportForm, now: Instant) -> ActionOutcome {
        if !self.begin(Operation::Import) {
            return ActionOutcome::Rejected;
        }
        let known: HashSet<String> = self.slides.iter().map(|s| s.name.clone()).collect();
        self.view.set_import_busy(true);

        match self.api.import(form) {
            Ok(()) => {
                tracing::info!(pdf = %form.pdf.display(), "import finished");
                self.finish_import();
                self.view.close_import_dialog();
                self.refresh();
                ActionOutcome::Done
            }
            Err(e) => {
                tracing::warn!("import request failed ({e}), re-checking listing");
                self.import_check = Some(ImportCheck {
                    known,
                    error: e.to_string(),
                });
                self.recheck_timer.restart(now, IMPORT_RECHECK_DELAY);
                ActionOutcome::Pending
            }
        }
    }

    fn finish_import(&mut self) {
        self.busy.release(Operation::Import);
        self.view.set_import_busy(false);
    }

    fn reconcile_import(&mut self) -> ActionOutcome {
        let Some(check) = self.import_check.take() else {
            return ActionOutcome::Failed;
        };
        let outcome = match self.fetch_slides() {
            Ok(slides) => {
                let landed = slides.iter().any(|s| !check.known.contains(&s.name));
                self.slides = slides;
                self.render();
                if landed {
                    tracing::info!("import response was lost but the deck is listed");
                    self.view.close_import_dialog();
                    ActionOutcome::Done
                } else {
                    self.view.alert(&format!("Import failed: {}", check.error));
                    ActionOutcome::Failed
                }
            }
            Err(e) => {
                tracing::warn!("re-check listing failed: {e}");
                self.view.alert(&format!("Import failed: {}", check.error));
                ActionOutcome::Failed
            }
        };
        self.finish_import();
        outcome
    }

    pub fn edit(&mut self, name: &str, patch: &SlidePatch) -> ActionOutcome {
        if patch.title.trim().is_empty() {
            self.view.alert("Title must not be empty.");
            return ActionOutcome::Rejected;
        }
        if !self.begin(Operation::Edit) {
            return ActionOutcome::Rejected;
        }
        let outcome = match self.api.update(name, patch) {
            Ok(()) => {
                tracing::info!(name, "deck updated");
                self.view.close_edit_dialog();
                self.refresh();
                ActionOutcome::Done
            }
            Err(e) => {
                self.view.alert(&format!("Failed to update {name}: {e}"));
                ActionOutcome::Failed
            }
        };
        self.busy.release(Operation::Edit);
        outcome
    }

    pub fn delete(&mut self, name: &str) -> ActionOutcome {
        if !self
            .view
            .confirm(&format!("Delete \"{name}\"? This cannot be undone."))
        {
            return ActionOutcome::Cancelled;
        }
        if !self.begin(Operation::Delete) {
            return ActionOutcome::Rejected;
        }
        let outcome = match self.api.delete(name) {
            Ok(()) => {
                tracing::info!(name, "deck deleted");
                self.refresh();
                ActionOutcome::Done
            }
            Err(e) => {
                self.view.alert(&format!("Failed to delete {name}: {e}"));
                ActionOutcome::Failed
            }
        };
        self.busy.release(Operation::Delete);
        outcome
    }

    fn open_channel(&mut self, now: Instant) {
        if self.mode != IndexMode::Dev {
            return;
        }
        match self.api.open_live_reload() {
            Ok(rx) => self.channel = Some(rx),
            Err(e) => {
                tracing::warn!("live reload unavailable ({e}), retrying");
                self.reconnect_timer.restart(now, RECONNECT_DELAY);
            }
        }
    }

    /// Drain pending server pushes.
    pub fn poll_live_reload(&mut self, now: Instant) {
        loop {
            let Some(channel) = &self.channel else { return };
            match channel.try_recv() {
                Ok(event) => self.on_channel_event(event, now),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.on_channel_event(
                        ChannelEvent::Error("live-reload channel disconnected".to_string()),
                        now,
                    );
                }
            }
        }
    }

    pub fn on_channel_event(&mut self, event: ChannelEvent, now: Instant) {
        match event {
            ChannelEvent::Message(LiveReloadMessage::Connected) => {
                tracing::info!("live reload connected");
            }
            ChannelEvent::Message(LiveReloadMessage::Reload { reason, file }) => {
                if let Some(op) = self.busy.current() {
                    tracing::info!(?reason, ?file, "reload skipped, {} in progress", op.label());
                    return;
                }
                tracing::info!(?reason, ?file, "reload requested");
                self.reload_timer.restart(now, RELOAD_SETTLE_DELAY);
            }
            ChannelEvent::Error(message) => {
                tracing::warn!("live reload error: {message}");
                self.channel = None;
                self.reconnect_timer.restart(now, RECONNECT_DELAY);
            }
        }
    }

    /// Fire due timers. Returns the import result when a reconciliation finished.
    pub fn tick(&mut self, now: Instant) -> Option<ActionOutcome> {
        let mut resolved = None;
        if self.recheck_timer.fire(now) {
            resolved = Some(self.reconcile_import());
        }
        if self.reload_timer.fire(now) {
            if self.busy.is_busy() {
                tracing::info!("reload skipped, operation in progress");
            } else {
                self.view.reload_page();
            }
        }
        if self.reconnect_timer.fire(now) {
            tracing::debug!("reopening live-reload channel");
            self.open_channel(now);
        }
        resolved
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        timer::next_deadline(&[&self.recheck_timer, &self.reload_timer, &self.reconnect_timer])
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    pub fn slides(&self) -> &[SlideSummary] {
        &self.slides
    }

    pub fn is_live(&self) -> bool {
        self.channel.is_some()
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, Sender};

    type Listing = Result<Vec<SlideSummary>, ApiError>;

    #[derive(Default)]
    struct FakeApi {
        listings: RefCell<VecDeque<Listing>>,
        static_index: RefCell<Option<Listing>>,
        import_result: RefCell<Option<Result<(), ApiError>>>,
        write_result: RefCell<Option<Result<(), ApiError>>>,
        channels: RefCell<Vec<Sender<ChannelEvent>>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeApi {
        fn push_listing(&self, listing: Listing) {
            self.listings.borrow_mut().push_back(listing);
        }
    }

    fn offline() -> ApiError {
        ApiError::Network("connection refused".into())
    }

    impl SlideApi for &FakeApi {
        fn list_slides(&self) -> Result<Vec<SlideSummary>, ApiError> {
            self.calls.borrow_mut().push("list".into());
            self.listings
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(offline()))
        }

        fn static_index(&self) -> Result<Vec<SlideSummary>, ApiError> {
            self.calls.borrow_mut().push("static".into());
            self.static_index.borrow_mut().take().unwrap_or_else(|| Err(offline()))
        }

        fn import(&self, form: &ImportForm) -> Result<(), ApiError> {
            self.calls
                .borrow_mut()
                .push(format!("import {}", form.pdf.display()));
            self.import_result.borrow_mut().take().unwrap_or(Ok(()))
        }

        fn update(&self, name: &str, _patch: &SlidePatch) -> Result<(), ApiError> {
            self.calls.borrow_mut().push(format!("update {name}"));
            self.write_result.borrow_mut().take().unwrap_or(Ok(()))
        }

        fn delete(&self, name: &str) -> Result<(), ApiError> {
            self.calls.borrow_mut().push(format!("delete {name}"));
            self.write_result.borrow_mut().take().unwrap_or(Ok(()))
        }

        fn open_live_reload(&self) -> Result<Receiver<ChannelEvent>, ApiError> {
            self.calls.borrow_mut().push("live".into());
            let (tx, rx) = mpsc::channel();
            self.channels.borrow_mut().push(tx);
            Ok(rx)
        }
    }

    #[derive(Default)]
    struct RecordingView {
        mode: Option<IndexMode>,
        rendered: Vec<Vec<String>>,
        empty_renders: usize,
        alerts: Vec<String>,
        confirm_answer: bool,
        import_closed: usize,
        edit_closed: usize,
        reloads: usize,
    }

    impl IndexView for RecordingView {
        fn set_mode(&mut self, mode: IndexMode) {
            self.mode = Some(mode);
        }

        fn render_slides(&mut self, slides: &[SlideSummary]) {
            self.rendered
                .push(slides.iter().map(|s| s.name.clone()).collect());
        }

        fn render_empty(&mut self) {
            self.empty_renders += 1;
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn confirm(&mut self, _message: &str) -> bool {
            self.confirm_answer
        }

        fn set_import_busy(&mut self, _busy: bool) {}

        fn close_import_dialog(&mut self) {
            self.import_closed += 1;
        }

        fn close_edit_dialog(&mut self) {
            self.edit_closed += 1;
        }

        fn reload_page(&mut self) {
            self.reloads += 1;
        }
    }

    fn deck(name: &str) -> SlideSummary {
        SlideSummary {
            name: name.to_string(),
            title: None,
            description: None,
            page_count: 3,
            format: "png".into(),
            created_at: "2024-01-01".into(),
            thumbnail: None,
        }
    }

    fn form() -> ImportForm {
        ImportForm {
            pdf: "talk.pdf".into(),
            ..Default::default()
        }
    }

    fn dev_controller(api: &FakeApi) -> SlideIndexController<&FakeApi, RecordingView> {
        api.push_listing(Ok(vec![deck("intro")]));
        let mut c =
            SlideIndexController::new(api, RecordingView::default(), None).with_live_reload();
        c.initialize(Instant::now());
        assert_eq!(c.mode(), IndexMode::Dev);
        c
    }

    #[test]
    fn test_dev_mode_renders_probe_listing_and_opens_channel() {
        let api = FakeApi::default();
        let c = dev_controller(&api);
        assert_eq!(c.view.rendered, vec![vec!["intro".to_string()]]);
        assert!(c.is_live());
        assert_eq!(*api.calls.borrow(), vec!["list", "live"]);
    }

    #[test]
    fn test_dev_mode_without_live_reload_opens_no_channel() {
        let api = FakeApi::default();
        api.push_listing(Ok(vec![deck("intro")]));
        let mut c = SlideIndexController::new(&api, RecordingView::default(), None);
        c.initialize(Instant::now());
        assert_eq!(c.mode(), IndexMode::Dev);
        assert!(!c.is_live());
        assert_eq!(*api.calls.borrow(), vec!["list"]);
    }

    #[test]
    fn test_static_mode_prefers_embedded_data() {
        let api = FakeApi::default();
        let mut c =
            SlideIndexController::new(&api, RecordingView::default(), Some(vec![deck("local")]));
        c.initialize(Instant::now());
        assert_eq!(c.mode(), IndexMode::Static);
        assert_eq!(c.view.rendered, vec![vec!["local".to_string()]]);
        assert!(!api.calls.borrow().contains(&"static".to_string()));
        assert!(!c.is_live());
    }

    #[test]
    fn test_static_mode_falls_back_to_index_file() {
        let api = FakeApi::default();
        *api.static_index.borrow_mut() = Some(Ok(vec![deck("published")]));
        let mut c = SlideIndexController::new(&api, RecordingView::default(), None);
        c.initialize(Instant::now());
        assert_eq!(c.view.rendered, vec![vec!["published".to_string()]]);
    }

    #[test]
    fn test_static_mode_without_sources_shows_empty_state() {
        let api = FakeApi::default();
        let mut c = SlideIndexController::new(&api, RecordingView::default(), None);
        c.initialize(Instant::now());
        assert_eq!(c.view.empty_renders, 1);
        assert!(c.view.rendered.is_empty());
        assert!(c.view.alerts.is_empty());
    }

    #[test]
    fn test_static_mode_rejects_management() {
        let api = FakeApi::default();
        let mut c = SlideIndexController::new(&api, RecordingView::default(), None);
        c.initialize(Instant::now());
        assert_eq!(c.import(&form(), Instant::now()), ActionOutcome::Rejected);
        assert_eq!(c.view.alerts.len(), 1);
    }

    #[test]
    fn test_import_success_closes_dialog_and_reloads_list() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        api.push_listing(Ok(vec![deck("intro"), deck("talk")]));
        assert_eq!(c.import(&form(), Instant::now()), ActionOutcome::Done);
        assert_eq!(c.view.import_closed, 1);
        assert_eq!(c.slides().len(), 2);
        assert!(!c.busy.is_busy());
    }

    #[test]
    fn test_failed_import_that_landed_counts_as_success() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        *api.import_result.borrow_mut() = Some(Err(ApiError::Network("timed out".into())));
        let start = Instant::now();

        assert_eq!(c.import(&form(), start), ActionOutcome::Pending);
        assert!(c.busy.is_busy());
        assert_eq!(c.tick(start + Duration::from_millis(100)), None);

        api.push_listing(Ok(vec![deck("intro"), deck("talk")]));
        let outcome = c.tick(start + IMPORT_RECHECK_DELAY);
        assert_eq!(outcome, Some(ActionOutcome::Done));
        assert_eq!(c.view.import_closed, 1);
        assert!(c.view.alerts.is_empty());
        assert!(!c.busy.is_busy());
    }

    #[test]
    fn test_failed_import_without_new_deck_alerts() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        *api.import_result.borrow_mut() = Some(Err(ApiError::Status {
            status: 400,
            message: "not a PDF".into(),
        }));
        let start = Instant::now();
        c.import(&form(), start);

        api.push_listing(Ok(vec![deck("intro")]));
        assert_eq!(c.tick(start + IMPORT_RECHECK_DELAY), Some(ActionOutcome::Failed));
        assert_eq!(c.view.import_closed, 0);
        assert_eq!(c.view.alerts.len(), 1);
        assert!(c.view.alerts[0].contains("not a PDF"));
        assert!(!c.busy.is_busy());
    }

    #[test]
    fn test_failed_import_with_unreachable_listing_alerts_original_error() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        *api.import_result.borrow_mut() = Some(Err(ApiError::Status {
            status: 413,
            message: "file too large".into(),
        }));
        let start = Instant::now();
        assert_eq!(c.import(&form(), start), ActionOutcome::Pending);

        // No listing queued: the re-check fails to reach the server.
        assert_eq!(
            c.tick(start + IMPORT_RECHECK_DELAY + Duration::from_millis(1)),
            Some(ActionOutcome::Failed)
        );
        assert_eq!(c.view.alerts.len(), 1);
        assert!(c.view.alerts[0].contains("file too large"));
        assert_eq!(c.view.import_closed, 0);
        assert!(!c.busy.is_busy());
    }

    #[test]
    fn test_second_operation_rejected_while_importing() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        *api.import_result.borrow_mut() = Some(Err(offline()));
        c.import(&form(), Instant::now());
        c.view_mut().confirm_answer = true;
        assert_eq!(c.delete("intro"), ActionOutcome::Rejected);
        assert!(!api.calls.borrow().iter().any(|call| call.starts_with("delete")));
    }

    #[test]
    fn test_edit_success_and_failure() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        let patch = SlidePatch {
            title: "New".into(),
            description: String::new(),
            created_at: "2024-02-02".into(),
        };

        api.push_listing(Ok(vec![deck("intro")]));
        assert_eq!(c.edit("intro", &patch), ActionOutcome::Done);
        assert_eq!(c.view.edit_closed, 1);

        *api.write_result.borrow_mut() = Some(Err(ApiError::Status {
            status: 404,
            message: "Slide not found".into(),
        }));
        assert_eq!(c.edit("intro", &patch), ActionOutcome::Failed);
        assert_eq!(c.view.edit_closed, 1);
        assert!(c.view.alerts[0].contains("Slide not found"));
    }

    #[test]
    fn test_edit_rejects_blank_title() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        assert_eq!(c.edit("intro", &SlidePatch::default()), ActionOutcome::Rejected);
        assert!(!api.calls.borrow().iter().any(|call| call.starts_with("update")));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        assert_eq!(c.delete("intro"), ActionOutcome::Cancelled);

        c.view_mut().confirm_answer = true;
        api.push_listing(Ok(vec![]));
        assert_eq!(c.delete("intro"), ActionOutcome::Done);
        assert_eq!(c.view.empty_renders, 1);
    }

    #[test]
    fn test_reload_message_reloads_after_settle_delay() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        let start = Instant::now();
        api.channels.borrow()[0]
            .send(ChannelEvent::Message(LiveReloadMessage::Reload {
                reason: Some("change".into()),
                file: None,
            }))
            .unwrap();
        c.poll_live_reload(start);
        c.tick(start);
        assert_eq!(c.view.reloads, 0);
        c.tick(start + RELOAD_SETTLE_DELAY);
        assert_eq!(c.view.reloads, 1);
    }

    #[test]
    fn test_reload_skipped_while_importing() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        let start = Instant::now();
        *api.import_result.borrow_mut() = Some(Err(offline()));
        c.import(&form(), start);

        c.on_channel_event(
            ChannelEvent::Message(LiveReloadMessage::Reload {
                reason: None,
                file: None,
            }),
            start,
        );
        api.push_listing(Ok(vec![deck("intro")]));
        c.tick(start + Duration::from_secs(5));
        assert_eq!(c.view.reloads, 0);
    }

    #[test]
    fn test_channel_error_reconnects_after_fixed_delay() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        let start = Instant::now();

        for round in 1..=3u32 {
            let now = start + RECONNECT_DELAY * (round - 1) * 2;
            c.on_channel_event(ChannelEvent::Error("reset".into()), now);
            assert!(!c.is_live());
            assert_eq!(c.next_deadline(), Some(now + RECONNECT_DELAY));
            c.tick(now + RECONNECT_DELAY);
            assert!(c.is_live());
        }
        let opens = api.calls.borrow().iter().filter(|call| *call == "live").count();
        assert_eq!(opens, 4);
    }

    #[test]
    fn test_dropped_sender_counts_as_channel_error() {
        let api = FakeApi::default();
        let mut c = dev_controller(&api);
        api.channels.borrow_mut().clear();
        let now = Instant::now();
        c.poll_live_reload(now);
        assert!(!c.is_live());
        assert_eq!(c.next_deadline(), Some(now + RECONNECT_DELAY));
    }
}
