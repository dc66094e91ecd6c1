//! Policies, routes and warmups: record commands plus the publish workflow.

use edadmin_api::ApiClient;
use edadmin_api::endpoints::PublishAction;
use edadmin_core::ResourceKind;

use crate::cli::{GlobalOpts, PublishableArgs, PublishableCommand};
use crate::error::CliError;

use super::{resources, util};

pub async fn handle(
    client: &ApiClient,
    kind: ResourceKind,
    args: PublishableArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (id, action) = match args.command {
        PublishableCommand::Record(cmd) => return resources::handle(client, kind, cmd, global).await,
        PublishableCommand::Publish { id } => (id, PublishAction::Publish),
        PublishableCommand::Revert { id } => {
            let prompt = format!("Discard unpublished changes to {} '{id}'?", kind.singular());
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            (id, PublishAction::Revert)
        }
        PublishableCommand::Duplicate { id } => (id, PublishAction::Duplicate),
    };

    let bar = util::spinner(&format!("{action} {}", kind.singular()), global);
    let result = client.publish_action(kind.collection(), &id, action).await;
    bar.finish_and_clear();
    let response = result?;

    let message = match action {
        PublishAction::Publish => format!("Published {} {id}", kind.singular()),
        PublishAction::Revert => format!("Reverted {} {id}", kind.singular()),
        PublishAction::Duplicate => match response.get("id").and_then(|v| v.as_str()) {
            Some(copy) => format!("Duplicated {} {id} as {copy}", kind.singular()),
            None => format!("Duplicated {} {id}", kind.singular()),
        },
    };
    util::status(global, &message);
    Ok(())
}
