use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use super::{Context, deck_location};
use crate::gui::{self, EguiView};
use crate::model::ViewerMode;
use crate::viewer::{ViewerController, ViewerOptions};

pub struct ViewArgs {
    pub deck: String,
    pub page: Option<usize>,
    pub scroll: bool,
    pub windowed: bool,
    pub width: f32,
    pub from_list: bool,
}

pub fn run(ctx: &Context, args: ViewArgs) -> Result<()> {
    let api = ctx.api()?;
    let location = deck_location(api.base(), &args.deck, args.page, args.scroll, args.from_list)?;
    let options = ViewerOptions {
        viewport_width: args.width,
        narrow_width: ctx.config.narrow_width(),
        default_mode: ctx.config.viewer_mode().unwrap_or(ViewerMode::Paged),
    };

    let viewer =
        ViewerController::open(EguiView::default(), &api, location, options, Instant::now())?;
    tracing::info!(deck = viewer.name(), pages = viewer.total_slides(), "opening viewer");

    let closed_to = gui::run(viewer, api.clone(), args.windowed, args.width)?;
    if let Some(list) = closed_to {
        if !ctx.quiet {
            println!("{} {}", "Back to".dimmed(), list);
        }
        super::index::list(ctx, None)?;
    }
    Ok(())
}
