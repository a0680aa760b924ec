//! List rows command implementation.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::ItemArgs;
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Table ID
    pub table_id: String,

    /// Return at most this many rows (default: all rows)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Filter as FIELD:OPERATOR[:VALUE] (repeatable)
    #[arg(long = "filter", value_name = "FIELD:OP[:VALUE]")]
    pub filters: Vec<String>,

    /// Sort as FIELD[:asc|desc] (repeatable, applied in order)
    #[arg(long, value_name = "FIELD[:DIR]")]
    pub sort: Vec<String>,

    /// Combine filters with AND or OR
    #[arg(long)]
    pub filter_type: Option<String>,

    /// Full-text search term
    #[arg(long)]
    pub search: Option<String>,

    #[command(flatten)]
    pub item: ItemArgs,
}

pub async fn run(args: ListArgs, connection: &ConnectionArgs) -> Result<()> {
    let mut params = args.item.params("getAll", &args.table_id);

    match args.limit {
        Some(limit) => {
            params.return_all = Some(Value::Bool(false));
            params.limit = Some(Value::from(limit));
        }
        None => params.return_all = Some(Value::Bool(true)),
    }
    if !args.filters.is_empty() {
        params.filters = Some(args.filters.into_iter().map(Value::String).collect());
    }
    if !args.sort.is_empty() {
        params.sort = Some(args.sort.into_iter().map(Value::String).collect());
    }
    params.filter_type = args.filter_type;
    params.search = args.search;

    args.item.run(params, connection).await
}
