//! Create row command implementation.

use anyhow::Result;
use clap::Args;

use super::{DataArgs, ItemArgs};
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Table ID
    pub table_id: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub item: ItemArgs,
}

pub async fn run(args: CreateArgs, connection: &ConnectionArgs) -> Result<()> {
    let mut params = args.item.params("create", &args.table_id);
    args.data.apply(&mut params);
    args.item.run(params, connection).await
}
