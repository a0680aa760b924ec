//! Row subcommand implementations.

mod create;
mod delete;
mod get;
mod list;
mod update;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

use rowkit_core::RawItemParams;
use rowkit_core::params::RawFieldValue;

use super::input;
use crate::cli::ConnectionArgs;

#[derive(Args, Debug)]
pub struct RowCommand {
    #[command(subcommand)]
    pub command: RowSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RowSubcommand {
    /// Create a row per input record
    Create(create::CreateArgs),

    /// Fetch a single row
    Get(get::GetArgs),

    /// Update a row per input record
    Update(update::UpdateArgs),

    /// Delete a row
    Delete(delete::DeleteArgs),

    /// List rows of a table
    #[command(alias = "get-all")]
    List(list::ListArgs),
}

pub async fn handle(cmd: RowCommand, connection: &ConnectionArgs) -> Result<()> {
    match cmd.command {
        RowSubcommand::Create(args) => create::run(args, connection).await,
        RowSubcommand::Get(args) => get::run(args, connection).await,
        RowSubcommand::Update(args) => update::run(args, connection).await,
        RowSubcommand::Delete(args) => delete::run(args, connection).await,
        RowSubcommand::List(args) => list::run(args, connection).await,
    }
}

/// Flags shared by every row command.
#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Input records as a JSON array or JSON lines (use - for stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Use field_<id> keys as-is instead of field names
    #[arg(long)]
    pub raw_fields: bool,
}

impl ItemArgs {
    fn params(&self, operation: &str, table_id: &str) -> RawItemParams {
        RawItemParams {
            resource: Some("row".to_string()),
            operation: Some(operation.to_string()),
            table_id: Some(Value::String(table_id.to_string())),
            raw_fields: self.raw_fields.then_some(true),
            ..Default::default()
        }
    }

    async fn run(&self, params: RawItemParams, connection: &ConnectionArgs) -> Result<()> {
        let inputs = input::input_records(self.input.as_deref())?;
        super::run_items(connection, super::items_for(&params, inputs)).await
    }
}

/// How create and update build the row body.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Set a field explicitly (repeatable); input records are then ignored
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = input::parse_assignment)]
    pub fields: Vec<(String, Value)>,

    /// Comma-separated input keys to leave out when mapping input records
    #[arg(long, conflicts_with = "fields")]
    pub ignore: Option<String>,
}

impl DataArgs {
    fn apply(self, params: &mut RawItemParams) {
        if self.fields.is_empty() {
            params.data_to_send = Some("autoMapInputData".to_string());
            params.inputs_to_ignore = self.ignore.map(Value::String);
        } else {
            params.data_to_send = Some("defineBelow".to_string());
            params.field_values = Some(
                self.fields
                    .into_iter()
                    .map(|(field, value)| RawFieldValue {
                        field_id: Value::String(field),
                        field_value: value,
                    })
                    .collect(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkit_core::{ItemParams, RowOperation};
    use serde_json::json;

    fn item_args() -> ItemArgs {
        ItemArgs {
            input: None,
            raw_fields: false,
        }
    }

    #[test]
    fn explicit_fields_select_define_below() {
        let mut params = item_args().params("create", "7");
        DataArgs {
            fields: vec![("Name".to_string(), json!("Ada"))],
            ignore: None,
        }
        .apply(&mut params);

        assert_eq!(params.data_to_send.as_deref(), Some("defineBelow"));
        let validated = ItemParams::from_raw(&params).unwrap();
        assert!(matches!(validated.operation, RowOperation::Create { .. }));
    }

    #[test]
    fn no_fields_auto_maps_with_ignore() {
        let mut params = item_args().params("update", "7");
        params.row_id = Some(json!("3"));
        DataArgs {
            fields: Vec::new(),
            ignore: Some("id,order".to_string()),
        }
        .apply(&mut params);

        assert_eq!(params.data_to_send.as_deref(), Some("autoMapInputData"));
        assert_eq!(params.inputs_to_ignore, Some(json!("id,order")));
        assert!(ItemParams::from_raw(&params).is_ok());
    }
}
