//! Batch command implementation.

use anyhow::Result;
use clap::Args;

use rowkit_core::HostItem;

use super::input;
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// File of `{"params": {...}, "json": {...}}` items, as a JSON array or
    /// JSON lines (use - for stdin)
    pub file: String,
}

pub async fn run(args: BatchArgs, connection: &ConnectionArgs) -> Result<()> {
    let items: Vec<HostItem> = input::parse_many(&input::read_source(&args.file)?)?;
    super::run_items(connection, items).await
}
