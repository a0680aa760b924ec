//! Update row command implementation.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::{DataArgs, ItemArgs};
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Table ID
    pub table_id: String,

    /// Row ID
    pub row_id: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub item: ItemArgs,
}

pub async fn run(args: UpdateArgs, connection: &ConnectionArgs) -> Result<()> {
    let mut params = args.item.params("update", &args.table_id);
    params.row_id = Some(Value::String(args.row_id));
    args.data.apply(&mut params);
    args.item.run(params, connection).await
}
