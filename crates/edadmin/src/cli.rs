//! Clap derive structures for the `edadmin` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Compiled twice: into the binary and into `build.rs` for man pages, so
//! this file depends on nothing but `clap` and `clap_complete`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// edadmin -- command-line administration for the email delivery platform
#[derive(Debug, Parser)]
#[command(
    name = "edadmin",
    version,
    about = "Administer an email delivery platform from the command line",
    long_about = "Edit broadcasts, contact lists, delivery policies, customers and\n\
        the rest of the admin console's records over its REST API.\n\n\
        Every edit loads the record, applies your changes, and saves it\n\
        back with a single POST (new records) or PATCH (existing ones).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "EDADMIN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'u', env = "EDADMIN_URL", global = true)]
    pub url: Option<String>,

    /// Customer id to act as on non-admin endpoints
    #[arg(long = "as", env = "EDADMIN_IMPERSONATE", global = true)]
    pub impersonate: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EDADMIN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "EDADMIN_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "EDADMIN_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and cache the session for the active profile
    Login(LoginArgs),

    /// Forget the cached session for the active profile
    Logout,

    /// Broadcasts (one-off campaigns)
    #[command(alias = "bc")]
    Broadcasts(BroadcastsArgs),

    /// Contact lists
    Lists(ResourceArgs),

    /// Contact segments
    Segments(ResourceArgs),

    /// Suppression lists
    #[command(name = "supplists", alias = "supp-lists")]
    SuppLists(ResourceArgs),

    /// Delivery policies
    Policies(PublishableArgs),

    /// Postal routes
    Routes(PublishableArgs),

    /// IP warmup schedules
    Warmups(PublishableArgs),

    /// Domain groups used by routes
    #[command(name = "domaingroups", alias = "domain-groups")]
    DomainGroups(ResourceArgs),

    /// Delivery servers (sinks)
    #[command(alias = "sinks")]
    Servers(ResourceArgs),

    /// Per-domain send throttles
    Throttles(ResourceArgs),

    /// DKIM settings (one document per account)
    Dkim(SingletonArgs),

    /// Webhooks
    #[command(alias = "resthooks")]
    Webhooks(WebhooksArgs),

    /// Transactional templates
    Templates(ResourceArgs),

    /// Customer accounts
    #[command(alias = "companies")]
    Customers(CustomersArgs),

    /// Users of the current account
    Users(ResourceArgs),

    /// Frontends (white-label installations)
    Frontends(ResourceArgs),

    /// SMTP relays
    #[command(name = "smtprelays", alias = "smtp-relays")]
    SmtpRelays(ResourceArgs),

    /// Delivery reports
    Reports(ReportsArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Search, sort and paging for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive substring filter
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort column; prefix with '-' for descending (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Vec<String>,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,

    /// Saved table view (the `tablestate` value of a report link)
    #[arg(long, conflicts_with_all = ["search", "sort"])]
    pub tablestate: Option<String>,
}

/// Field edits applied to a record before it is saved.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Set a field: path=value (value parsed as JSON, else taken as text)
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Remove a field by path
    #[arg(long = "unset", value_name = "PATH")]
    pub unset: Vec<String>,

    /// Update document ({"field": {"$set": ..}}), inline or @file
    #[arg(long, value_name = "JSON")]
    pub patch: Option<String>,

    /// Merge a JSON object from a file into the record
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,

    /// Print the payload instead of saving it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record with its supporting data
    #[command(alias = "get")]
    Show {
        /// Record id
        id: String,
    },

    /// Create a record from its blank template
    #[command(alias = "create")]
    New {
        /// Extra location parameters copied onto the new record (key=value)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Load a record, apply edits, and save it
    #[command(alias = "update")]
    Edit {
        /// Record id
        id: String,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record id
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PUBLISHABLE (policies, routes, warmups)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PublishableArgs {
    #[command(subcommand)]
    pub command: PublishableCommand,
}

#[derive(Debug, Subcommand)]
pub enum PublishableCommand {
    #[command(flatten)]
    Record(ResourceCommand),

    /// Make staged edits live
    Publish {
        /// Record id
        id: String,
    },

    /// Discard staged edits
    Revert {
        /// Record id
        id: String,
    },

    /// Copy the record under a new name
    Duplicate {
        /// Record id
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SINGLETONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SingletonArgs {
    #[command(subcommand)]
    pub command: SingletonCommand,
}

#[derive(Debug, Subcommand)]
pub enum SingletonCommand {
    /// Show the document
    #[command(alias = "get")]
    Show,

    /// Load the document, apply edits, and save it
    Edit(EditArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BROADCASTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BroadcastsArgs {
    #[command(subcommand)]
    pub command: BroadcastsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BroadcastsCommand {
    #[command(flatten)]
    Record(ResourceCommand),

    /// Copy a broadcast into a new draft
    Duplicate {
        /// Broadcast id
        id: String,
    },

    /// Stop a scheduled or sending broadcast
    Cancel {
        /// Broadcast id
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CUSTOMERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomersCommand {
    #[command(flatten)]
    Record(ResourceCommand),

    /// Approve customers waiting for review
    Approve {
        /// Customer ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Ban customers
    Ban {
        /// Customer ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Lift a ban
    Unban {
        /// Customer ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Pause sending
    Pause {
        /// Customer ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Resume sending
    Unpause {
        /// Customer ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show a customer's credit balance
    Credits {
        /// Customer id
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WEBHOOKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WebhooksArgs {
    #[command(subcommand)]
    pub command: WebhooksCommand,
}

#[derive(Debug, Subcommand)]
pub enum WebhooksCommand {
    #[command(flatten)]
    Record(ResourceCommand),

    /// Send a sample event to a webhook target
    Test {
        /// Webhook id (uses its target URL and event)
        #[arg(required_unless_present = "target_url")]
        id: Option<String>,

        /// Target URL to test instead of a saved webhook
        #[arg(long, conflicts_with = "id")]
        target_url: Option<String>,

        /// Event whose example payload is sent (e.g. open_click)
        #[arg(long)]
        event: Option<String>,
    },

    /// List the events a webhook can subscribe to
    Events,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// Delivery summary of recent broadcasts
    Broadcasts {
        /// Filter by name or subject (server side)
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Only broadcasts sent before this timestamp
        #[arg(long, conflicts_with = "newer")]
        older: Option<String>,

        /// Only broadcasts sent after this timestamp
        #[arg(long)]
        newer: Option<String>,
    },

    /// Per-domain delivery statistics for one broadcast
    Domains {
        /// Broadcast id
        id: String,

        #[command(flatten)]
        list: ListArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login name (defaults to the profile's username)
    #[arg(long, env = "EDADMIN_USERNAME")]
    pub username: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, username, impersonate, insecure, timeout, ca_cert, password_env)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
