//! Command dispatch: bridges CLI args -> resource bindings -> output formatting.

pub mod broadcasts;
pub mod config_cmd;
pub mod customers;
pub mod publishing;
pub mod reports;
pub mod resources;
pub mod session;
pub mod util;
pub mod webhooks;

use edadmin_api::ApiClient;
use edadmin_core::ResourceKind;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ApiClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Broadcasts(args) => broadcasts::handle(client, args, global).await,
        Command::Customers(args) => customers::handle(client, args, global).await,
        Command::Webhooks(args) => webhooks::handle(client, args, global).await,
        Command::Reports(args) => reports::handle(client, args, global).await,
        Command::Dkim(args) => {
            resources::handle_singleton(client, ResourceKind::Dkim, args, global).await
        }

        Command::Policies(args) => {
            publishing::handle(client, ResourceKind::Policies, args, global).await
        }
        Command::Routes(args) => publishing::handle(client, ResourceKind::Routes, args, global).await,
        Command::Warmups(args) => {
            publishing::handle(client, ResourceKind::Warmups, args, global).await
        }

        Command::Lists(args) => record(client, ResourceKind::Lists, args, global).await,
        Command::Segments(args) => record(client, ResourceKind::Segments, args, global).await,
        Command::SuppLists(args) => record(client, ResourceKind::SuppLists, args, global).await,
        Command::DomainGroups(args) => {
            record(client, ResourceKind::DomainGroups, args, global).await
        }
        Command::Servers(args) => record(client, ResourceKind::Servers, args, global).await,
        Command::Throttles(args) => record(client, ResourceKind::Throttles, args, global).await,
        Command::Templates(args) => record(client, ResourceKind::Templates, args, global).await,
        Command::Users(args) => record(client, ResourceKind::Users, args, global).await,
        Command::Frontends(args) => record(client, ResourceKind::Frontends, args, global).await,
        Command::SmtpRelays(args) => record(client, ResourceKind::SmtpRelays, args, global).await,

        // Handled before a client is built
        Command::Config(_) | Command::Completions(_) | Command::Login(_) | Command::Logout => {
            unreachable!()
        }
    }
}

async fn record(
    client: &ApiClient,
    kind: ResourceKind,
    args: crate::cli::ResourceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    resources::handle(client, kind, args.command, global).await
}
