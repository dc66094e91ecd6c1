//! Customer command handlers: record commands, moderation, credits.

use serde::Serialize;
use tabled::Tabled;

use edadmin_api::ApiClient;
use edadmin_api::endpoints::CompanyAction;
use edadmin_api::models::CustomerCredits;
use edadmin_core::ResourceKind;

use crate::cli::{CustomersArgs, CustomersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{resources, util};

#[derive(Serialize)]
struct CreditsView<'a> {
    id: &'a str,
    #[serde(flatten)]
    credits: CustomerCredits,
}

#[derive(Tabled)]
struct CreditsRow {
    #[tabled(rename = "Customer")]
    id: String,
    #[tabled(rename = "Credits")]
    unlimited: String,
    #[tabled(rename = "Expiring")]
    expire: String,
}

pub async fn handle(
    client: &ApiClient,
    args: CustomersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (action, ids) = match args.command {
        CustomersCommand::Record(cmd) => {
            return resources::handle(client, ResourceKind::Customers, cmd, global).await;
        }
        CustomersCommand::Credits { id } => return credits(client, &id, global).await,
        CustomersCommand::Approve { ids } => (CompanyAction::Approve, ids),
        CustomersCommand::Ban { ids } => (CompanyAction::Ban, ids),
        CustomersCommand::Unban { ids } => (CompanyAction::Unban, ids),
        CustomersCommand::Pause { ids } => (CompanyAction::Pause, ids),
        CustomersCommand::Unpause { ids } => (CompanyAction::Unpause, ids),
    };

    if action.is_destructive() {
        let prompt = format!("{action} {} customer(s)?", ids.len());
        if !util::confirm(&prompt, global.yes)? {
            return Ok(());
        }
    }

    client.company_action(action, &ids).await?;
    util::status(global, &format!("{action}: {}", ids.join(", ")));
    Ok(())
}

async fn credits(client: &ApiClient, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let credits = client.company_credits(id).await?;
    let view = CreditsView { id, credits };
    let out = output::render_list(
        &global.output,
        std::slice::from_ref(&view),
        |v| CreditsRow {
            id: v.id.to_owned(),
            unlimited: v.credits.unlimited.to_string(),
            expire: v.credits.expire.to_string(),
        },
        |v| v.credits.unlimited.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
