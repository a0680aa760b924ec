//! Command implementations.

pub mod batch;
pub mod input;
pub mod row;

use anyhow::{Context, Result};
use tracing::info;

use rowkit_core::dispatch::merge_outcomes;
use rowkit_core::{Dispatcher, HostItem, ItemOutcome, RawItemParams, Record};

use crate::cli::ConnectionArgs;
use crate::config;
use crate::output;

/// Pair the same parameters with every input record.
pub fn items_for(params: &RawItemParams, inputs: Vec<Record>) -> Vec<HostItem> {
    inputs
        .into_iter()
        .map(|json| HostItem::new(params.clone(), json))
        .collect()
}

/// Dispatch host items and print every output record as a JSON line.
pub async fn run_items(connection: &ConnectionArgs, items: Vec<HostItem>) -> Result<()> {
    let client = config::build_client(connection)?;
    let dispatcher = Dispatcher::new(client).continue_on_fail(connection.continue_on_fail);

    info!(items = items.len(), "Running items");
    let outcomes = dispatcher.run_outcomes(&items).await;
    let (records, failed) =
        merge_counting_failures(outcomes, connection.continue_on_fail).context("Batch aborted")?;

    for record in &records {
        output::json(record)?;
    }

    if failed > 0 {
        output::warning(&format!("{} of {} items failed", failed, items.len()));
    } else {
        output::success(&format!("{} records", records.len()));
    }
    Ok(())
}

/// Merge outcomes into output records, also returning how many items failed.
///
/// Only real item failures count. A successful record that happens to carry
/// an `error` column does not.
fn merge_counting_failures(
    outcomes: Vec<ItemOutcome>,
    continue_on_fail: bool,
) -> rowkit_core::Result<(Vec<Record>, usize)> {
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    let records = merge_outcomes(outcomes, continue_on_fail)?;
    Ok((records, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkit_core::{Error, ValidationError};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn failure() -> ItemOutcome {
        ItemOutcome::Failure(Error::Validation(ValidationError::MissingParameter {
            name: "rowId".to_string(),
        }))
    }

    #[test]
    fn counts_only_failed_items() {
        let outcomes = vec![
            ItemOutcome::Success(vec![record(json!({"error": "stored text"}))]),
            failure(),
            ItemOutcome::Success(vec![record(json!({"id": 1}))]),
        ];

        let (records, failed) = merge_counting_failures(outcomes, true).unwrap();
        assert_eq!(failed, 1);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["error"], "stored text");
        assert!(records[1]["error"].as_str().unwrap().contains("rowId"));
    }

    #[test]
    fn error_column_alone_is_not_a_failure() {
        let outcomes = vec![ItemOutcome::Success(vec![record(json!({"error": "x"}))])];
        let (_, failed) = merge_counting_failures(outcomes, false).unwrap();
        assert_eq!(failed, 0);
    }

    #[test]
    fn failure_aborts_without_continue_on_fail() {
        let outcomes = vec![ItemOutcome::Success(vec![record(json!({"id": 1}))]), failure()];
        assert!(merge_counting_failures(outcomes, false).is_err());
    }
}
