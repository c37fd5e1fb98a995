use anyhow::Result;
use colored::Colorize;
use std::time::Instant;
use url::Url;

use super::{Context, deck_location};
use crate::model::ViewerMode;
use crate::viewer::{
    CopyTarget, EnvError, OverviewEntry, Preview, ShareLinks, SlotRole, ViewerController,
    ViewerOptions, ViewerView,
};

/// Viewer without a screen: only the resolved location and share links matter.
struct Headless;

impl ViewerView for Headless {
    fn set_slot(&mut self, _slot: usize, _role: SlotRole, _src: Option<&str>) {}
    fn set_progress(&mut self, _percent: f32) {}
    fn set_nav_visibility(&mut self, _previous: bool, _next: bool) {}
    fn set_title(&mut self, _title: &str) {}
    fn replace_url(&mut self, _url: &Url) {}
    fn set_loading(&mut self, _loading: bool) {}
    fn set_mode(&mut self, _mode: ViewerMode, _pages: &[String]) {}
    fn scroll_to_page(&mut self, _page: usize) {}
    fn show_preview(&mut self, _preview: Option<&Preview>) {}
    fn build_overview(&mut self, _entries: &[OverviewEntry]) {}
    fn show_overview(&mut self, _open: bool, _current: usize) {}
    fn show_share(&mut self, _links: Option<&ShareLinks>) {}

    fn copy_to_clipboard(&mut self, _text: &str) -> Result<(), EnvError> {
        Err(EnvError::Unavailable("clipboard"))
    }

    fn show_copied(&mut self, _target: Option<CopyTarget>) {}
    fn alert(&mut self, _message: &str) {}

    fn request_fullscreen(&mut self, _on: bool) -> Result<(), EnvError> {
        Err(EnvError::Unavailable("fullscreen"))
    }

    fn set_fullscreen_icon(&mut self, _fullscreen: bool) {}
    fn set_controls_visible(&mut self, _visible: bool) {}
    fn show_close_to_list(&mut self, _visible: bool) {}
    fn navigate(&mut self, _url: &Url) {}
}

pub fn run(ctx: &Context, deck: &str, page: Option<usize>, scroll: bool) -> Result<()> {
    let api = ctx.api()?;
    let location = deck_location(api.base(), deck, page, false, false)?;
    let options = ViewerOptions {
        viewport_width: f32::MAX,
        narrow_width: ctx.config.narrow_width(),
        default_mode: ViewerMode::Paged,
    };
    let mut viewer = ViewerController::open(Headless, &api, location, options, Instant::now())?;
    if scroll {
        viewer.set_share_mode(ViewerMode::Scroll);
    }
    let links = viewer.share_links();

    if ctx.quiet {
        println!("{}", links.url);
        return Ok(());
    }
    println!(
        "{} ({} pages)",
        viewer.title().bold(),
        viewer.total_slides()
    );
    println!();
    println!("{}", "Link".dimmed());
    println!("  {}", links.url);
    println!();
    println!("{}", "Embed".dimmed());
    println!("  {}", links.embed);
    Ok(())
}
