//! Webhook command handlers.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use edadmin_api::ApiClient;
use edadmin_api::models::{Webhook, WebhookEvent};
use edadmin_core::ResourceKind;

use crate::cli::{GlobalOpts, WebhooksArgs, WebhooksCommand};
use crate::error::CliError;
use crate::output;

use super::{resources, util};

#[derive(Serialize)]
struct EventInfo {
    event: WebhookEvent,
    description: &'static str,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Fires")]
    description: String,
}

pub async fn handle(
    client: &ApiClient,
    args: WebhooksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WebhooksCommand::Record(cmd) => {
            resources::handle(client, ResourceKind::Webhooks, cmd, global).await
        }
        WebhooksCommand::Test {
            id,
            target_url,
            event,
        } => {
            let event = event.as_deref().map(parse_event).transpose()?;
            let (url, event) = match (id, target_url) {
                (_, Some(url)) => (url, event.unwrap_or_default()),
                (Some(id), None) => {
                    let hook: Webhook = client.fetch(ResourceKind::Webhooks.collection(), &id).await?;
                    (hook.target_url, event.unwrap_or(hook.event))
                }
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "target".into(),
                        reason: "pass a webhook id or --target-url".into(),
                    });
                }
            };
            test(client, &url, event, global).await
        }
        WebhooksCommand::Events => {
            list_events(global);
            Ok(())
        }
    }
}

async fn test(
    client: &ApiClient,
    url: &str,
    event: WebhookEvent,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bar = util::spinner(&format!("Sending {event} to {url}"), global);
    let result = client.test_webhook(url, event).await;
    bar.finish_and_clear();
    let result = result?;

    let out = output::render_single(
        &global.output,
        &result,
        |r| {
            let status = r.status_code.map(|c| c.to_string()).unwrap_or_else(|| "-".into());
            if r.success {
                format!("Delivered ({status})")
            } else {
                let reason = r.error.clone().or_else(|| r.response.clone()).unwrap_or_default();
                format!("Failed ({status}) {reason}")
            }
        },
        |r| r.success.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the events a webhook can subscribe to.
pub fn list_events(global: &GlobalOpts) {
    let events: Vec<EventInfo> = WebhookEvent::iter()
        .map(|event| EventInfo {
            event,
            description: event.description(),
        })
        .collect();
    let out = output::render_list(
        &global.output,
        &events,
        |e| EventRow {
            event: e.event.to_string(),
            description: e.description.to_owned(),
        },
        |e| e.event.to_string(),
    );
    output::print_output(&out, global.quiet);
}

fn parse_event(raw: &str) -> Result<WebhookEvent, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "event".into(),
        reason: format!("unknown event '{raw}'; see `edadmin webhooks events`"),
    })
}
