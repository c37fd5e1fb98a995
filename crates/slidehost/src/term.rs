//! Terminal rendering of the slide listing.

use colored::Colorize;

use crate::index::{IndexMode, IndexView};
use crate::model::SlideSummary;

const DESCRIPTION_WIDTH: usize = 60;

pub struct TermView {
    quiet: bool,
    assume_yes: bool,
    mode: Option<IndexMode>,
    reload_requested: bool,
}

impl TermView {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            assume_yes: false,
            mode: None,
            reload_requested: false,
        }
    }

    /// Answer every confirmation with yes instead of prompting.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Returns and clears a pending reload request.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }
}

impl IndexView for TermView {
    fn set_mode(&mut self, mode: IndexMode) {
        if self.mode == Some(mode) || self.quiet {
            self.mode = Some(mode);
            return;
        }
        self.mode = Some(mode);
        let label = match mode {
            IndexMode::Dev => "dev mode (management API available)".green(),
            IndexMode::Static => "static mode (read-only)".yellow(),
        };
        println!("{} {label}", "●".dimmed());
    }

    fn render_slides(&mut self, slides: &[SlideSummary]) {
        for slide in slides {
            tracing::debug!(deck = %slide.name, thumbnail = %slide.thumbnail_path(), "listed");
        }
        for line in format_listing(slides) {
            println!("{line}");
        }
    }

    fn render_empty(&mut self) {
        println!("{}", "No slide decks yet.".yellow());
        if self.mode == Some(IndexMode::Dev) && !self.quiet {
            println!("Import one with {}", "slidehost import <file.pdf>".bold());
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{} {message}", "error:".red().bold());
    }

    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        inquire::Confirm::new(message)
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }

    fn set_import_busy(&mut self, busy: bool) {
        if busy && !self.quiet {
            println!("{}", "Importing...".dimmed());
        }
    }

    fn close_import_dialog(&mut self) {
        println!("{}", "Import complete.".green().bold());
    }

    fn close_edit_dialog(&mut self) {
        println!("{}", "Saved.".green().bold());
    }

    fn reload_page(&mut self) {
        self.reload_requested = true;
    }
}

/// One header line plus one or two lines per deck.
fn format_listing(slides: &[SlideSummary]) -> Vec<String> {
    let name_width = slides
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut lines = vec![format!(
        "{:<name_width$}  {:>5}  {:<10}  {}",
        "NAME", "PAGES", "CREATED", "TITLE"
    )
    .bold()
    .to_string()];

    for slide in slides {
        lines.push(format!(
            "{:<name_width$}  {:>5}  {:<10}  {}",
            slide.name.cyan(),
            slide.page_count,
            slide.created_at,
            slide.display_title()
        ));
        if let Some(description) = slide.description.as_deref().filter(|d| !d.trim().is_empty()) {
            lines.push(format!(
                "{:<name_width$}  {}",
                "",
                truncate(description.trim(), DESCRIPTION_WIDTH).dimmed()
            ));
        }
    }
    lines
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(name: &str, title: Option<&str>, description: Option<&str>) -> SlideSummary {
        SlideSummary {
            name: name.into(),
            title: title.map(Into::into),
            description: description.map(Into::into),
            page_count: 12,
            format: "png".into(),
            created_at: "2024-05-01".into(),
            thumbnail: None,
        }
    }

    #[test]
    fn test_listing_falls_back_to_name_and_skips_blank_descriptions() {
        colored::control::set_override(false);
        let lines = format_listing(&[
            slide("intro", Some("Introduction"), Some("Kickoff deck")),
            slide("q3-review", None, Some("  ")),
        ]);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Introduction"));
        assert!(lines[2].contains("Kickoff deck"));
        assert!(lines[3].ends_with("q3-review"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_reload_flag_is_taken_once() {
        let mut view = TermView::new(true);
        view.reload_page();
        assert!(view.take_reload());
        assert!(!view.take_reload());
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        let mut view = TermView::new(true).assume_yes(true);
        assert!(view.confirm("Delete intro?"));
    }
}
