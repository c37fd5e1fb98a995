use anyhow::{Context as _, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::Context;
use crate::api::HttpApi;
use crate::index::{ActionOutcome, IndexMode, SlideIndexController};
use crate::model::{ImportForm, SlideList, SlidePatch, SlideSummary};
use crate::term::TermView;

/// Longest sleep of the watch loop between polls of the live-reload channel.
const WATCH_POLL: Duration = Duration::from_millis(100);

type Controller = SlideIndexController<HttpApi, TermView>;

fn controller(ctx: &Context, data: Option<PathBuf>, yes: bool) -> Result<Controller> {
    let embedded = match data.as_deref().or_else(|| ctx.config.embedded_index()) {
        Some(path) => Some(load_embedded(path)?),
        None => None,
    };
    Ok(SlideIndexController::new(
        ctx.api()?,
        TermView::new(ctx.quiet).assume_yes(yes),
        embedded,
    ))
}

pub fn load_embedded(path: &Path) -> Result<Vec<SlideSummary>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let list: SlideList = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid slide list in {}", path.display()))?;
    Ok(list.slides)
}

pub fn list(ctx: &Context, data: Option<PathBuf>) -> Result<()> {
    let mut controller = controller(ctx, data, false)?;
    controller.initialize(Instant::now());
    Ok(())
}

/// Management commands need the dev-mode API.
fn require_dev(controller: &Controller) -> Result<()> {
    if controller.mode() != IndexMode::Dev {
        anyhow::bail!("The management API is not available on this server.");
    }
    Ok(())
}

pub fn import(ctx: &Context, form: &ImportForm) -> Result<()> {
    let mut controller = controller(ctx, None, false)?;
    controller.initialize(Instant::now());
    require_dev(&controller)?;

    let outcome = match controller.import(form, Instant::now()) {
        ActionOutcome::Pending => wait_for_reconciliation(&mut controller),
        outcome => outcome,
    };
    finish(outcome, "Import failed.")
}

/// Sleep through the recheck delay until the follow-up listing resolves the import.
fn wait_for_reconciliation(controller: &mut Controller) -> ActionOutcome {
    println!("{}", "Checking whether the import landed anyway...".dimmed());
    loop {
        let now = Instant::now();
        if let Some(deadline) = controller.next_deadline() {
            std::thread::sleep(deadline.saturating_duration_since(now));
        }
        if let Some(outcome) = controller.tick(Instant::now()) {
            return outcome;
        }
    }
}

pub fn edit(
    ctx: &Context,
    name: &str,
    title: Option<String>,
    description: Option<String>,
    created_at: Option<String>,
) -> Result<()> {
    let mut controller = controller(ctx, None, false)?;
    controller.initialize(Instant::now());
    require_dev(&controller)?;

    let current = controller
        .slides()
        .iter()
        .find(|s| s.name == name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No deck named {name}"))?;
    let patch = merge_patch(&current, title, description, created_at);

    let outcome = controller.edit(name, &patch);
    finish(outcome, "Edit failed.")
}

/// Fields left out on the command line keep their current values.
fn merge_patch(
    current: &SlideSummary,
    title: Option<String>,
    description: Option<String>,
    created_at: Option<String>,
) -> SlidePatch {
    SlidePatch {
        title: title.unwrap_or_else(|| current.display_title().to_string()),
        description: description.unwrap_or_else(|| current.description.clone().unwrap_or_default()),
        created_at: created_at.unwrap_or_else(|| current.created_at.clone()),
    }
}

pub fn delete(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let mut controller = controller(ctx, None, yes)?;
    controller.initialize(Instant::now());
    require_dev(&controller)?;

    match controller.delete(name) {
        ActionOutcome::Done => {
            println!("{} {}", "Deleted".green().bold(), name);
            Ok(())
        }
        ActionOutcome::Cancelled => {
            println!("{}", "Cancelled.".yellow());
            Ok(())
        }
        outcome => finish(outcome, "Delete failed."),
    }
}

fn finish(outcome: ActionOutcome, failure: &str) -> Result<()> {
    match outcome {
        ActionOutcome::Done | ActionOutcome::Cancelled => Ok(()),
        ActionOutcome::Pending | ActionOutcome::Failed | ActionOutcome::Rejected => {
            anyhow::bail!("{failure}")
        }
    }
}

pub fn watch(ctx: &Context, data: Option<PathBuf>) -> Result<()> {
    let mut controller = controller(ctx, data, false)?.with_live_reload();
    controller.initialize(Instant::now());
    if controller.mode() == IndexMode::Static {
        println!("{}", "Live reload needs the management API; nothing to watch.".yellow());
        return Ok(());
    }
    println!("{}", "Watching for changes (Ctrl+C to stop)".dimmed());

    let mut live = controller.is_live();
    loop {
        let now = Instant::now();
        controller.poll_live_reload(now);
        controller.tick(now);
        if controller.is_live() != live {
            live = controller.is_live();
            if !live {
                eprintln!("{}", "Live reload disconnected, retrying...".yellow());
            }
        }
        if controller.view_mut().take_reload() {
            println!();
            controller.initialize(Instant::now());
        }

        let now = Instant::now();
        let sleep = controller
            .next_deadline()
            .map(|d| d.saturating_duration_since(now).min(WATCH_POLL))
            .unwrap_or(WATCH_POLL);
        std::thread::sleep(sleep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn summary() -> SlideSummary {
        SlideSummary {
            name: "intro".into(),
            title: Some("Introduction".into()),
            description: None,
            page_count: 4,
            format: "png".into(),
            created_at: "2024-05-01".into(),
            thumbnail: None,
        }
    }

    #[test]
    fn test_merge_patch_keeps_unspecified_fields() {
        let patch = merge_patch(&summary(), None, Some("New".into()), None);
        assert_eq!(
            patch,
            SlidePatch {
                title: "Introduction".into(),
                description: "New".into(),
                created_at: "2024-05-01".into(),
            }
        );
    }

    #[test]
    fn test_load_embedded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"slides":[{{"name":"intro","pageCount":4,"createdAt":"2024-05-01"}}]}}"#
        )
        .unwrap();
        let slides = load_embedded(file.path()).unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].page_count, 4);
        assert_eq!(slides[0].format, "png");
    }

    #[test]
    fn test_load_embedded_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_embedded(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid slide list"));
    }

    #[test]
    fn test_finish_maps_outcomes() {
        assert!(finish(ActionOutcome::Done, "x").is_ok());
        assert!(finish(ActionOutcome::Cancelled, "x").is_ok());
        assert!(finish(ActionOutcome::Failed, "x").is_err());
        assert!(finish(ActionOutcome::Rejected, "x").is_err());
    }
}
