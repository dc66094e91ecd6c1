//! Rendering for `--output table|json|json-compact|yaml|plain`.
//!
//! Renders data in the format selected by `--output`. Typed rows use the
//! `Tabled` derive; schemaless records (the generic resource commands) go
//! through `tabled::builder::Builder` with the columns each screen shows.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use edadmin_core::table::cell_text;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// `--color auto` honours `NO_COLOR` and only colours a terminal.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint a status word: green for healthy, yellow for in-flight, red for
/// anything that stopped.
pub fn paint_status(status: &str, color: bool) -> String {
    if !color {
        return status.to_owned();
    }
    match status {
        "complete" | "active" | "published" | "ok" => status.green().to_string(),
        "sending" | "scheduled" | "paused" | "in review" | "unpublished" => {
            status.yellow().to_string()
        }
        "canceled" | "error" | "banned" => status.red().to_string(),
        _ => status.to_owned(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Typed rows. `to_row` only feeds the table view; json and yaml serialize
/// `data` itself, and plain prints one `id_fn` per line.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render JSON rows, showing `columns` in table mode.
pub fn render_records(format: &OutputFormat, rows: &[Value], columns: &[&str]) -> String {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| c.to_uppercase()));
            for row in rows {
                builder.push_record(
                    columns
                        .iter()
                        .map(|c| row.get(*c).map(cell_text).unwrap_or_default()),
                );
            }
            builder.build().with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(rows, false),
        OutputFormat::JsonCompact => render_json(rows, true),
        OutputFormat::Yaml => render_yaml(rows),
        OutputFormat::Plain => rows
            .iter()
            .map(|r| r.get("id").map(cell_text).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// One item. The table view is whatever `detail_fn` produces.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Key/value detail view of a JSON object; nested values print as compact
/// JSON.
pub fn detail_table(value: &Value) -> String {
    let Some(fields) = value.as_object() else {
        return cell_text(value);
    };
    let mut builder = Builder::default();
    for (key, field) in fields {
        let text = match field {
            Value::Array(_) | Value::Object(_) => render_json(field, true),
            other => cell_text(other),
        };
        builder.push_record([key.clone(), text]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Write rendered output to stdout unless `--quiet`.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_records_print_ids() {
        let rows = vec![json!({"id": "a", "name": "x"}), json!({"id": 7})];
        assert_eq!(render_records(&OutputFormat::Plain, &rows, &["name"]), "a\n7");
    }

    #[test]
    fn table_records_show_requested_columns() {
        let rows = vec![json!({"id": "a", "name": "Weekly", "secret": "s"})];
        let out = render_records(&OutputFormat::Table, &rows, &["id", "name"]);
        assert!(out.contains("Weekly"));
        assert!(out.contains("NAME"));
        assert!(!out.contains("secret"));
    }

    #[test]
    fn uncolored_status_is_unchanged() {
        assert_eq!(paint_status("canceled", false), "canceled");
    }
}
