//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rowkit_core::AuthMode;

use crate::commands::batch::BatchArgs;
use crate::commands::row::RowCommand;

/// Run row operations against a table database.
#[derive(Parser, Debug)]
#[command(name = "rowkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to connect, how to authenticate and how to run the batch.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// API host URL (defaults to the hosted service)
    #[arg(long, env = "ROWKIT_HOST", global = true)]
    pub host: Option<String>,

    /// Authentication mode: token or usernamePassword
    #[arg(long, env = "ROWKIT_AUTH_MODE", global = true)]
    pub auth_mode: Option<AuthMode>,

    /// Database API token
    #[arg(long, env = "ROWKIT_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Account username (email)
    #[arg(long, env = "ROWKIT_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "ROWKIT_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// JSON credential file (defaults to the config directory's credentials.json)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Emit an error record for a failed item and keep going
    #[arg(long, global = true)]
    pub continue_on_fail: bool,

    /// Reuse session tokens across calls instead of exchanging per call
    #[arg(long, global = true)]
    pub cache_token: bool,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Single row operations
    Row(RowCommand),

    /// Run a file of host items
    Batch(BatchArgs),
}
