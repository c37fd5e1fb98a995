use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::api::DeckSource;

enum Entry {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

type Decoded = (String, Result<egui::ColorImage, String>);

/// Slide textures keyed by image URL. Fetch and decode run on the rayon pool;
/// uploads happen on the UI thread in [`ImageStore::poll`].
pub struct ImageStore<S> {
    source: S,
    entries: HashMap<String, Entry>,
    tx: Sender<Decoded>,
    rx: Receiver<Decoded>,
}

impl<S: DeckSource + Clone + Send + 'static> ImageStore<S> {
    pub fn new(source: S) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            entries: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Starts loading `url` unless it is already known.
    pub fn request(&mut self, ctx: &egui::Context, url: &str) {
        if self.entries.contains_key(url) {
            return;
        }
        self.entries.insert(url.to_string(), Entry::Loading);

        let source = self.source.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let url = url.to_string();
        rayon::spawn(move || {
            let result = source
                .fetch_bytes(&url)
                .map_err(|e| e.to_string())
                .and_then(|bytes| decode(&bytes));
            let _ = tx.send((url, result));
            ctx.request_repaint();
        });
    }

    /// Uploads finished decodes. Returns the URLs that settled this frame.
    pub fn poll(&mut self, ctx: &egui::Context) -> Vec<String> {
        let mut settled = Vec::new();
        while let Ok((url, result)) = self.rx.try_recv() {
            let entry = match result {
                Ok(image) => Entry::Ready(ctx.load_texture(
                    url.clone(),
                    image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    tracing::warn!(%url, "slide image failed: {e}");
                    Entry::Failed
                }
            };
            self.entries.insert(url.clone(), entry);
            settled.push(url);
        }
        settled
    }

    pub fn texture(&self, url: &str) -> Option<&egui::TextureHandle> {
        match self.entries.get(url) {
            Some(Entry::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn is_settled(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(Entry::Ready(_) | Entry::Failed))
    }

    pub fn is_failed(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(Entry::Failed))
    }
}

fn decode(bytes: &[u8]) -> Result<egui::ColorImage, String> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| e.to_string())?
        .into_rgba8();
    let (w, h) = image.dimensions();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        image.as_raw(),
    ))
}
