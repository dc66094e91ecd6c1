mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts, WebhooksArgs, WebhooksCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `-v` steps warn → info → debug → trace; `RUST_LOG` wins when set.
fn init_tracing(verbosity: u8) {
    let level = ["warn", "info", "debug"]
        .get(usize::from(verbosity))
        .copied()
        .unwrap_or("trace");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        Command::Config(args) => commands::config_cmd::handle(args, &global),
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "edadmin", &mut std::io::stdout());
            Ok(())
        }
        Command::Login(args) => commands::session::login(args, &global).await,
        Command::Logout => commands::session::logout(&global),
        Command::Webhooks(WebhooksArgs {
            command: WebhooksCommand::Events,
        }) => {
            commands::webhooks::list_events(&global);
            Ok(())
        }
        command => connected(command, &global).await,
    }
}

/// Everything else talks to the backend with the active profile's session.
async fn connected(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let client = config::build_client_config(global)?.connect().await?;
    tracing::debug!(?command, "dispatching");
    commands::dispatch(command, &client, global).await
}
