//! Delivery report handlers.

use serde_json::{Value, json};
use tabled::Tabled;

use edadmin_api::ApiClient;
use edadmin_api::endpoints::BroadcastQuery;
use edadmin_api::models::{Broadcast, DomainStats};
use edadmin_core::{Location, ResourceKind, TableView, ratio_pct};

use crate::cli::{GlobalOpts, OutputFormat, ReportsArgs, ReportsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const DOMAIN_COLUMNS: &[&str] = &[
    "domain", "count", "send", "open", "click", "unsub", "complaint", "soft", "hard", "flags",
];

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct BroadcastRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Sent")]
    sent: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Delivered")]
    delivered: String,
    #[tabled(rename = "Opened")]
    opened: String,
    #[tabled(rename = "Clicked")]
    clicked: String,
    #[tabled(rename = "Bounced")]
    bounced: String,
    #[tabled(rename = "Complaints")]
    complained: String,
}

impl BroadcastRow {
    fn new(b: &Broadcast, color: bool) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            sent: b.sent_at.clone().unwrap_or_default(),
            status: output::paint_status(&b.status().to_string().to_lowercase(), color),
            count: b.count,
            delivered: rate_text(b.delivered, b.send),
            opened: rate_text(b.opened, b.delivered),
            clicked: rate_text(b.clicked, b.delivered),
            bounced: rate_text(b.bounced, b.send),
            complained: rate_text(b.complained, b.delivered),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ApiClient,
    args: ReportsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ReportsCommand::Broadcasts {
            search,
            older,
            newer,
        } => {
            let query = BroadcastQuery {
                search,
                older,
                newer,
            };
            let broadcasts = client.list_broadcasts(&query).await?;
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &broadcasts,
                |b| BroadcastRow::new(b, color),
                |b| b.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReportsCommand::Domains { id, list } => {
            let state = util::table_state(&list)?;
            let (stats, title) =
                tokio::join!(client.broadcast_domain_stats(&id), broadcast_name(client, &id));
            let rows: Vec<Value> = stats?.iter().map(domain_row).collect();
            let page = TableView::new(rows).apply(&state, &["domain"]);

            if let (OutputFormat::Table, Some(name)) = (&global.output, title) {
                util::status(global, &format!("Domain stats for {name}"));
            }
            let out = output::render_records(&global.output, &page.rows, DOMAIN_COLUMNS);
            output::print_output(&out, global.quiet);
            util::page_footer(&page, global);

            // Resumable view: feed the tablestate back in with --tablestate.
            let view = state.apply_to(Location::new("/broadcasts/domains").with_param("id", id));
            tracing::info!(%view, "report view");
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Header only; a failed lookup never blocks the report.
async fn broadcast_name(client: &ApiClient, id: &str) -> Option<String> {
    match client.fetch::<Broadcast>(ResourceKind::Broadcasts.collection(), id).await {
        Ok(b) if !b.name.is_empty() => Some(b.name),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "broadcast name lookup failed");
            None
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn rate(n: u64, d: u64) -> f64 {
    (ratio_pct(n as f64, d as f64) * 100.0).round() / 100.0
}

fn rate_text(n: u64, d: u64) -> String {
    format!("{:.2}%", rate(n, d))
}

/// One domain row; rates are percentages of messages sent to the domain so
/// they sort numerically.
fn domain_row(s: &DomainStats) -> Value {
    let mut flags = Vec::new();
    if s.overdomainbounce {
        flags.push("bounce");
    }
    if s.overdomaincomplaint {
        flags.push("complaint");
    }
    json!({
        "domain": s.domain,
        "count": s.count,
        "send": s.send,
        "open": rate(s.open, s.send),
        "click": rate(s.click, s.send),
        "unsub": rate(s.unsub, s.send),
        "complaint": rate(s.complaint, s.send),
        "soft": rate(s.soft, s.send),
        "hard": rate(s.hard, s.send),
        "flags": flags.join(" "),
    })
}
