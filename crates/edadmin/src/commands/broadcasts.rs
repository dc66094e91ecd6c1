//! Broadcast command handlers.

use edadmin_api::ApiClient;
use edadmin_core::ResourceKind;

use crate::cli::{BroadcastsArgs, BroadcastsCommand, GlobalOpts};
use crate::error::CliError;

use super::{resources, util};

pub async fn handle(
    client: &ApiClient,
    args: BroadcastsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BroadcastsCommand::Record(cmd) => {
            resources::handle(client, ResourceKind::Broadcasts, cmd, global).await
        }

        BroadcastsCommand::Duplicate { id } => {
            let copy = client.duplicate_broadcast(&id).await?;
            match copy.get("id").and_then(|v| v.as_str()) {
                Some(new_id) => {
                    util::status(global, &format!("Duplicated broadcast {id} as {new_id}"));
                    crate::output::print_output(new_id, global.quiet);
                }
                None => util::status(global, &format!("Duplicated broadcast {id}")),
            }
            Ok(())
        }

        BroadcastsCommand::Cancel { id } => {
            if !util::confirm(&format!("Cancel broadcast '{id}'? Sending stops."), global.yes)? {
                return Ok(());
            }
            client.cancel_broadcast(&id).await?;
            util::status(global, &format!("Canceled broadcast {id}"));
            Ok(())
        }
    }
}
