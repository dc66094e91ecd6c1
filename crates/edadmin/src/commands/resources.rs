//! Generic record commands shared by every resource screen.
//!
//! `show`, `new` and `edit` mount the resource's binding, wait for the
//! record and its supporting lists, apply the edit flags, and submit. The
//! binder picks POST or PATCH from the record id.

use serde_json::Value;
use tokio::sync::broadcast;

use edadmin_api::ApiClient;
use edadmin_core::location::ID_PARAM;
use edadmin_core::{Binder, Location, Notification, ResourceKind, TableView};

use crate::cli::{EditArgs, GlobalOpts, ListArgs, ResourceCommand, SingletonArgs, SingletonCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    client: &ApiClient,
    kind: ResourceKind,
    cmd: ResourceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        ResourceCommand::List(args) => list(client, kind, &args, global).await,

        ResourceCommand::Show { id } => show(client, kind, &kind.location(Some(&id)), global).await,

        ResourceCommand::New { params, edit } => {
            if !kind.can_create() {
                return Err(CliError::Unsupported {
                    operation: format!("{kind} new"),
                    hint: format!(
                        "New {}s are not created from the command line; edit an existing one.",
                        kind.singular()
                    ),
                });
            }
            let mut location = kind.location(Some("new"));
            for pair in &params {
                let (key, value) = util::split_pair(pair, "param")?;
                location = location.with_param(key.trim(), value);
            }
            edit_and_save(client, kind, &location, &edit, global).await
        }

        ResourceCommand::Edit { id, edit } => {
            edit_and_save(client, kind, &kind.location(Some(&id)), &edit, global).await
        }

        ResourceCommand::Delete { id } => {
            if !util::confirm(&format!("Delete {} '{id}'?", kind.singular()), global.yes)? {
                return Ok(());
            }
            client.remove(kind.collection(), &id).await?;
            util::status(global, &format!("Deleted {} {id}", kind.singular()));
            Ok(())
        }
    }
}

/// Screens holding a single document per account (DKIM).
pub async fn handle_singleton(
    client: &ApiClient,
    kind: ResourceKind,
    args: SingletonArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let location = kind.location(None);
    match args.command {
        SingletonCommand::Show => {
            let (binder, _rx) = open(client, kind, &location, global).await?;
            let data = binder.data();
            let rows = keyed_rows(&data);
            let out = output::render_single(
                &global.output,
                &data,
                |_| output::render_records(&global.output, &rows, kind.list_columns()),
                |_| {
                    rows.iter()
                        .filter_map(|r| r.get("domain").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        SingletonCommand::Edit(edit) => edit_and_save(client, kind, &location, &edit, global).await,
    }
}

// ── Steps ───────────────────────────────────────────────────────────

async fn list(
    client: &ApiClient,
    kind: ResourceKind,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = util::table_state(args)?;
    let rows: Vec<Value> = client.list(kind.collection(), &[]).await?;
    let page = TableView::new(rows).apply(&state, kind.search_columns());

    let out = output::render_records(&global.output, &page.rows, kind.list_columns());
    output::print_output(&out, global.quiet);
    util::page_footer(&page, global);
    Ok(())
}

/// Mount `kind`'s binding at `location` and wait for the first load.
///
/// Failures of supporting lists are printed as warnings; the record itself
/// failing to load is an error.
pub async fn open(
    client: &ApiClient,
    kind: ResourceKind,
    location: &Location,
    global: &GlobalOpts,
) -> Result<(Binder<Value>, broadcast::Receiver<Notification>), CliError> {
    let (notifier, mut rx) = util::notifier();
    let binder = kind.binding(client).mount(location, notifier);

    let bar = util::spinner(&format!("Loading {}", kind.singular()), global);
    let loaded = binder.ready().await;
    bar.finish_and_clear();

    let outcome = loaded?;
    if !outcome.extra_failures.is_empty() {
        util::drain_notifications(&mut rx, global);
    }
    Ok((binder, rx))
}

async fn show(
    client: &ApiClient,
    kind: ResourceKind,
    location: &Location,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (binder, _rx) = open(client, kind, location, global).await?;
    let state = binder.state();

    let out = output::render_single(
        &global.output,
        &state.data,
        |data| {
            let mut text = output::detail_table(data);
            for (name, extra) in &state.extra {
                let summary = match extra {
                    Value::Array(items) => format!("{} entries", items.len()),
                    Value::Null => "unavailable".into(),
                    _ => "loaded".into(),
                };
                text.push_str(&format!("\n{name}: {summary}"));
            }
            text
        },
        |data| record_id(data).unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Load, apply the edit flags, and submit.
async fn edit_and_save(
    client: &ApiClient,
    kind: ResourceKind,
    location: &Location,
    edit: &EditArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let patch = util::edit_patch(edit)?;
    let (binder, mut rx) = open(client, kind, location, global).await?;

    match patch {
        Some(ref patch) => binder.update(patch)?,
        None if binder.id().is_new() => {}
        None => {
            return Err(CliError::Validation {
                field: "edit".into(),
                reason: "nothing to change; pass --set, --unset, --patch or --from-file".into(),
            });
        }
    }

    if edit.dry_run {
        let data = binder.data();
        let out = output::render_single(&global.output, &data, output::detail_table, |d| {
            record_id(d).unwrap_or_default()
        });
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let bar = util::spinner(&format!("Saving {}", kind.singular()), global);
    let submitted = binder.form_submit(true).await;
    bar.finish_and_clear();

    let outcome = submitted?;
    util::drain_notifications(&mut rx, global);

    match outcome.created {
        Some(ref created) => {
            let id = created.param(ID_PARAM).unwrap_or_default().to_owned();
            util::status(global, &format!("Created {} {id}", kind.singular()));
            let response = outcome.response.into_value();
            let out = output::render_single(
                &global.output,
                &response,
                |_| created.to_string(),
                |_| id.clone(),
            );
            output::print_output(&out, global.quiet);
        }
        None => {
            let id = binder.id().existing().map(str::to_owned).unwrap_or_default();
            if id.is_empty() {
                util::status(global, &format!("Saved {}", kind.singular()));
            } else {
                util::status(global, &format!("Saved {} {id}", kind.singular()));
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn record_id(data: &Value) -> Option<String> {
    match data.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `{"example.com": {..}}` → `[{"domain": "example.com", ..}]`.
fn keyed_rows(data: &Value) -> Vec<Value> {
    data.as_object()
        .map(|entries| {
            entries
                .iter()
                .map(|(key, entry)| {
                    let mut row = entry.as_object().cloned().unwrap_or_default();
                    row.insert("domain".into(), Value::String(key.clone()));
                    Value::Object(row)
                })
                .collect()
        })
        .unwrap_or_default()
}
