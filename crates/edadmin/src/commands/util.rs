//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::Value;

use edadmin_core::{Level, Notification, Notifier, Page, Patch, SortRule, TableState};

use crate::cli::{EditArgs, GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Spinner on stderr while a request runs; hidden when stderr is not a
/// terminal or `--quiet` is set.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner().with_message(message.to_owned());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn status(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

/// Print what the binder reported that the command result doesn't show
/// (e.g. a supporting list that failed to load).
pub fn drain_notifications(
    rx: &mut tokio::sync::broadcast::Receiver<Notification>,
    global: &GlobalOpts,
) {
    let color = crate::output::should_color(&global.color);
    while let Ok(note) = rx.try_recv() {
        if global.quiet && note.level != Level::Error {
            continue;
        }
        let tag = match (note.level, color) {
            (Level::Error, true) => "error:".red().to_string(),
            (Level::Warning, true) => "warning:".yellow().to_string(),
            (Level::Error, false) => "error:".into(),
            (Level::Warning, false) => "warning:".into(),
            (_, _) => "note:".into(),
        };
        eprintln!("{tag} {}", note.message);
    }
}

/// "Page 2/7 (131 rows)" under table output.
pub fn page_footer(page: &Page, global: &GlobalOpts) {
    if matches!(global.output, OutputFormat::Table) && page.page_count > 1 {
        status(
            global,
            &format!("Page {}/{} ({} rows)", page.page + 1, page.page_count, page.total),
        );
    }
}

/// Fresh notifier plus a subscription that sees everything it publishes.
pub fn notifier() -> (Notifier, tokio::sync::broadcast::Receiver<Notification>) {
    let notifier = Notifier::new();
    let rx = notifier.subscribe();
    (notifier, rx)
}

// ── Edit flags → Patch ──────────────────────────────────────────────

/// `--set` value: JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

pub fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::Validation {
            field: flag.into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        })
}

/// Combine `--from-file`, `--patch`, `--set` and `--unset` (in that order)
/// into one update. `None` when no edit flag was given.
pub fn edit_patch(args: &EditArgs) -> Result<Option<Patch>, CliError> {
    let mut steps = Vec::new();

    if let Some(ref path) = args.from_file {
        steps.push(Patch::Merge(read_object(&read_json_file(path)?)?));
    }

    if let Some(ref raw) = args.patch {
        let doc: Value = match raw.strip_prefix('@') {
            Some(path) => read_json_file(Path::new(path))?,
            None => serde_json::from_str(raw)?,
        };
        steps.push(Patch::from_json(&doc).map_err(edadmin_core::CoreError::from)?);
    }

    for pair in &args.set {
        let (path, value) = split_pair(pair, "set")?;
        steps.push(Patch::set_path(path.trim(), parse_value(value)));
    }

    for path in &args.unset {
        steps.push(Patch::unset_path(path.trim()));
    }

    Ok(steps.into_iter().reduce(Patch::then))
}

fn read_object(value: &Value) -> Result<serde_json::Map<String, Value>, CliError> {
    value.as_object().cloned().ok_or_else(|| CliError::Validation {
        field: "from-file".into(),
        reason: "expected a JSON object".into(),
    })
}

// ── List flags → TableState ─────────────────────────────────────────

/// Parse `count` / `-count` into a sort rule.
fn parse_sort(raw: &str) -> SortRule {
    match raw.strip_prefix('-') {
        Some(col) => SortRule::desc(col),
        None => SortRule::asc(raw.trim_start_matches('+')),
    }
}

/// The view-state a list command asks for: either a saved `--tablestate`
/// blob or the individual flags.
pub fn table_state(args: &ListArgs) -> Result<TableState, CliError> {
    if let Some(ref raw) = args.tablestate {
        return Ok(TableState::decode(raw).map_err(edadmin_core::CoreError::from)?);
    }
    Ok(TableState {
        search: args.search.clone().unwrap_or_default(),
        page: args.page.saturating_sub(1),
        page_size: args.limit,
        ..TableState::default()
    }
    .with_sort(args.sort.iter().map(|s| parse_sort(s)).collect()))
}
