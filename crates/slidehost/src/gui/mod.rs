//! Native viewer window.

mod app;
mod images;
mod view;

use eframe::egui;
use std::sync::mpsc;
use url::Url;

use crate::api::HttpApi;
use crate::viewer::ViewerController;

pub use view::EguiView;

/// Runs the viewer until the window closes. Returns the listing URL when the
/// user left through the close-to-list control.
pub fn run(
    viewer: ViewerController<EguiView>,
    source: HttpApi,
    windowed: bool,
    width: f32,
) -> anyhow::Result<Option<Url>> {
    let title = viewer.view().title.clone();

    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([width, width * 9.0 / 16.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let (tx, rx) = mpsc::channel();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(app::ViewerApp::new(cc, viewer, source, tx)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(rx.try_recv().ok())
}
