//! Get row command implementation.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::ItemArgs;
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Table ID
    pub table_id: String,

    /// Row ID
    pub row_id: String,

    #[command(flatten)]
    pub item: ItemArgs,
}

pub async fn run(args: GetArgs, connection: &ConnectionArgs) -> Result<()> {
    let mut params = args.item.params("get", &args.table_id);
    params.row_id = Some(Value::String(args.row_id));
    args.item.run(params, connection).await
}
