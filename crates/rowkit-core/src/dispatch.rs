//! Per-item operation dispatch.
//!
//! The [`Dispatcher`] walks host items strictly in order. Each item goes
//! through validation, an optional schema fetch, body translation, the API
//! call and result translation, and ends as an [`ItemOutcome`]. Outcomes are
//! merged at the end according to the continue-on-fail flag: isolated
//! failures become `{"error": ...}` records, otherwise the first failure
//! aborts the rest of the batch. Work already applied by earlier items is
//! never rolled back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::Error;
use crate::mapper::FieldMapper;
use crate::params::{ItemParams, RawItemParams, RowOperation};
use crate::schema::Record;
use crate::traits::RowApi;
use crate::Result;

/// One input item as the host hands it over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostItem {
    /// Parameter bag for this item.
    #[serde(default)]
    pub params: RawItemParams,
    /// The item's input record (used by auto-mapped create/update).
    #[serde(default)]
    pub json: Record,
}

impl HostItem {
    pub fn new(params: RawItemParams, json: Record) -> Self {
        Self { params, json }
    }
}

/// Result of processing one item.
#[derive(Debug)]
pub enum ItemOutcome {
    Success(Vec<Record>),
    Failure(Error),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failure(_))
    }
}

impl From<Result<Vec<Record>>> for ItemOutcome {
    fn from(result: Result<Vec<Record>>) -> Self {
        match result {
            Ok(records) => ItemOutcome::Success(records),
            Err(err) => ItemOutcome::Failure(err),
        }
    }
}

/// Record emitted in place of a failed item when failures are isolated.
pub fn error_record(err: &Error) -> Record {
    let mut record = Record::new();
    record.insert("error".to_string(), Value::String(err.to_string()));
    record
}

/// Acknowledgement emitted for every successful delete.
pub fn delete_ack() -> Record {
    let mut record = Record::new();
    record.insert("success".to_string(), Value::Bool(true));
    record
}

/// Flatten per-item outcomes into the output record sequence.
///
/// With `continue_on_fail` each failure is replaced by an error record;
/// without it the first failure is returned as the batch error.
pub fn merge_outcomes(outcomes: Vec<ItemOutcome>, continue_on_fail: bool) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Success(mut rows) => records.append(&mut rows),
            ItemOutcome::Failure(err) if continue_on_fail => records.push(error_record(&err)),
            ItemOutcome::Failure(err) => return Err(err),
        }
    }
    Ok(records)
}

/// Runs host items against a [`RowApi`], one at a time.
#[derive(Debug, Clone)]
pub struct Dispatcher<A> {
    api: A,
    continue_on_fail: bool,
}

impl<A: RowApi> Dispatcher<A> {
    /// Create a dispatcher that aborts on the first failed item.
    pub fn new(api: A) -> Self {
        Self {
            api,
            continue_on_fail: false,
        }
    }

    /// Isolate per-item failures instead of aborting the batch.
    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    /// Returns the underlying API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Process every item and return the merged output records.
    ///
    /// # Errors
    ///
    /// Without continue-on-fail, returns the first item's error; items after
    /// it are not processed.
    #[instrument(skip_all, fields(items = items.len(), continue_on_fail = self.continue_on_fail))]
    pub async fn run(&self, items: &[HostItem]) -> Result<Vec<Record>> {
        let outcomes = self.run_outcomes(items).await;
        merge_outcomes(outcomes, self.continue_on_fail)
    }

    /// Process items in order, stopping after the first failure unless
    /// failures are isolated.
    pub async fn run_outcomes(&self, items: &[HostItem]) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let outcome = self.process(index, item).await;
            let failed = outcome.is_failure();
            outcomes.push(outcome);
            if failed && !self.continue_on_fail {
                debug!(index, "Aborting batch after failed item");
                break;
            }
        }
        outcomes
    }

    /// Process a single item.
    #[instrument(skip(self, item))]
    pub async fn process(&self, index: usize, item: &HostItem) -> ItemOutcome {
        let result = match ItemParams::from_raw(&item.params) {
            Ok(params) => self.execute(&params, &item.json).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            warn!(index, error = %err, "Item failed");
        }
        result.into()
    }

    /// Execute validated parameters against the API.
    pub async fn execute(&self, params: &ItemParams, input: &Record) -> Result<Vec<Record>> {
        let op = &params.operation;
        debug!(operation = op.name(), table = %op.table(), "Dispatching row operation");

        let mapper = self.mapper_for(params).await?;

        match op {
            RowOperation::Create { table, data } => {
                let body = data.build_body(input, &mapper);
                let created = self.api.create_row(table, &body).await?;
                Ok(vec![mapper.to_names(&created)])
            }
            RowOperation::Get { table, row } => {
                let found = self.api.get_row(table, row).await?;
                Ok(vec![mapper.to_names(&found)])
            }
            RowOperation::Update { table, row, data } => {
                let body = data.build_body(input, &mapper);
                let updated = self.api.update_row(table, row, &body).await?;
                Ok(vec![mapper.to_names(&updated)])
            }
            RowOperation::Delete { table, row } => {
                self.api.delete_row(table, row).await?;
                Ok(vec![delete_ack()])
            }
            RowOperation::List {
                table,
                query,
                limit,
            } => {
                let params = query.to_query_params(&mapper);
                let rows = self.api.list_rows(table, &params, *limit).await?;
                debug!(count = rows.len(), "Listed rows");
                Ok(rows.iter().map(|row| mapper.to_names(row)).collect())
            }
        }
    }

    /// Build a fresh mapper for this item. Never reused across items, so
    /// batches touching several tables cannot see a stale schema.
    async fn mapper_for(&self, params: &ItemParams) -> Result<FieldMapper> {
        if params.raw_fields {
            return Ok(FieldMapper::raw());
        }
        if !params.operation.uses_fields() {
            return Ok(FieldMapper::default());
        }

        let fields = self.api.table_fields(params.operation.table()).await?;
        debug!(fields = fields.len(), "Fetched table schema");
        Ok(FieldMapper::build(&fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::params::RowLimit;
    use crate::query::QueryParams;
    use crate::schema::FieldSchemaEntry;
    use crate::types::{RowId, TableId};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory API that records every call.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        failing_row: Option<&'static str>,
        list_params: Mutex<Option<(QueryParams, RowLimit)>>,
    }

    impl FakeApi {
        fn failing_on(row: &'static str) -> Self {
            Self {
                failing_row: Some(row),
                ..Default::default()
            }
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, row: &RowId) -> Result<()> {
            if self.failing_row == Some(row.as_str()) {
                return Err(ApiError::status("GET", "/api/database/rows/", 500, "boom", None).into());
            }
            Ok(())
        }
    }

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[async_trait]
    impl RowApi for FakeApi {
        async fn table_fields(&self, table: &TableId) -> Result<Vec<FieldSchemaEntry>> {
            self.log(format!("fields {}", table));
            Ok(vec![
                FieldSchemaEntry::new("1", "Name"),
                FieldSchemaEntry::new("2", "Age"),
            ])
        }

        async fn create_row(&self, table: &TableId, body: &Record) -> Result<Record> {
            self.log(format!("create {} {}", table, Value::Object(body.clone())));
            let mut row = body.clone();
            row.insert("id".to_string(), json!(1));
            Ok(row)
        }

        async fn get_row(&self, table: &TableId, row: &RowId) -> Result<Record> {
            self.log(format!("get {} {}", table, row));
            self.check(row)?;
            Ok(rec(json!({"id": row.as_str(), "field_1": "Ada", "field_2": 36})))
        }

        async fn update_row(&self, table: &TableId, row: &RowId, body: &Record) -> Result<Record> {
            self.log(format!("update {} {} {}", table, row, Value::Object(body.clone())));
            self.check(row)?;
            Ok(body.clone())
        }

        async fn delete_row(&self, table: &TableId, row: &RowId) -> Result<()> {
            self.log(format!("delete {} {}", table, row));
            self.check(row)
        }

        async fn list_rows(
            &self,
            table: &TableId,
            query: &QueryParams,
            limit: RowLimit,
        ) -> Result<Vec<Record>> {
            self.log(format!("list {}", table));
            *self.list_params.lock().unwrap() = Some((query.clone(), limit));
            Ok(vec![
                rec(json!({"id": 1, "field_1": "Ada"})),
                rec(json!({"id": 2, "field_1": "Grace"})),
            ])
        }
    }

    fn item(params: Value, json: Value) -> HostItem {
        HostItem::new(serde_json::from_value(params).unwrap(), rec(json))
    }

    #[tokio::test]
    async fn create_translates_both_directions() {
        let dispatcher = Dispatcher::new(FakeApi::default());
        let out = dispatcher
            .run(&[item(
                json!({"operation": "create", "tableId": 7, "inputsToIgnore": "skip"}),
                json!({"Name": "Ada", "Age": 36, "skip": true}),
            )])
            .await
            .unwrap();

        assert_eq!(out, vec![rec(json!({"id": 1, "Name": "Ada", "Age": 36}))]);
        assert_eq!(
            dispatcher.api().calls(),
            vec![
                "fields 7".to_string(),
                r#"create 7 {"field_1":"Ada","field_2":36}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn delete_emits_acknowledgement_without_schema() {
        let dispatcher = Dispatcher::new(FakeApi::default());
        let out = dispatcher
            .run(&[item(
                json!({"operation": "delete", "tableId": 7, "rowId": 3}),
                json!({}),
            )])
            .await
            .unwrap();

        assert_eq!(out, vec![rec(json!({"success": true}))]);
        assert_eq!(dispatcher.api().calls(), vec!["delete 7 3".to_string()]);
    }

    #[tokio::test]
    async fn list_builds_query_through_mapper() {
        let dispatcher = Dispatcher::new(FakeApi::default());
        let out = dispatcher
            .run(&[item(
                json!({
                    "operation": "getAll",
                    "tableId": 7,
                    "returnAll": false,
                    "limit": 5,
                    "filters": ["Name:equal:Ada"],
                    "sort": ["Age:desc"]
                }),
                json!({}),
            )])
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["Name"], json!("Grace"));

        let (params, limit) = dispatcher.api().list_params.lock().unwrap().clone().unwrap();
        assert_eq!(limit, RowLimit::AtMost(5));
        assert_eq!(
            params,
            vec![
                ("filter__field_1__equal".to_string(), "Ada".to_string()),
                ("order_by".to_string(), "-field_2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn raw_fields_skip_schema_fetch() {
        let dispatcher = Dispatcher::new(FakeApi::default());
        let out = dispatcher
            .run(&[item(
                json!({"operation": "get", "tableId": 7, "rowId": 4, "rawFields": true}),
                json!({}),
            )])
            .await
            .unwrap();

        assert_eq!(out[0]["field_1"], json!("Ada"));
        assert_eq!(dispatcher.api().calls(), vec!["get 7 4".to_string()]);
    }

    #[tokio::test]
    async fn continue_on_fail_substitutes_error_record() {
        let dispatcher = Dispatcher::new(FakeApi::failing_on("2")).continue_on_fail(true);
        let items: Vec<_> = ["1", "2", "3"]
            .iter()
            .map(|row| item(json!({"operation": "get", "tableId": 7, "rowId": row}), json!({})))
            .collect();

        let out = dispatcher.run(&items).await.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["Name"], json!("Ada"));
        assert!(out[1]["error"].as_str().unwrap().contains("HTTP 500"));
        assert_eq!(out[1].len(), 1);
        assert_eq!(out[2]["id"], json!("3"));
    }

    #[tokio::test]
    async fn failure_without_isolation_aborts_remaining_items() {
        let dispatcher = Dispatcher::new(FakeApi::failing_on("2"));
        let items: Vec<_> = ["1", "2", "3"]
            .iter()
            .map(|row| item(json!({"operation": "delete", "tableId": 7, "rowId": row}), json!({})))
            .collect();

        let err = dispatcher.run(&items).await.unwrap_err();

        assert!(matches!(err, Error::Api(_)));
        assert_eq!(
            dispatcher.api().calls(),
            vec!["delete 7 1".to_string(), "delete 7 2".to_string()]
        );
    }

    #[tokio::test]
    async fn invalid_params_fail_only_their_item() {
        let dispatcher = Dispatcher::new(FakeApi::default()).continue_on_fail(true);
        let out = dispatcher
            .run(&[
                item(json!({"operation": "get", "tableId": 7}), json!({})),
                item(json!({"operation": "delete", "tableId": 7, "rowId": 1}), json!({})),
            ])
            .await
            .unwrap();

        assert!(out[0]["error"].as_str().unwrap().contains("rowId"));
        assert_eq!(out[1], rec(json!({"success": true})));
    }

    #[test]
    fn merge_keeps_item_order() {
        let outcomes = vec![
            ItemOutcome::Success(vec![rec(json!({"a": 1})), rec(json!({"a": 2}))]),
            ItemOutcome::Failure(ApiError::status("GET", "/x", 404, "gone", None).into()),
            ItemOutcome::Success(vec![]),
            ItemOutcome::Success(vec![rec(json!({"a": 3}))]),
        ];
        let out = merge_outcomes(outcomes, true).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[3]["a"], json!(3));
    }
}
