//! Row API trait.

use async_trait::async_trait;

use crate::params::RowLimit;
use crate::query::QueryParams;
use crate::schema::{FieldSchemaEntry, Record};
use crate::types::{RowId, TableId};
use crate::Result;

/// Access to the rows of a table-oriented database API.
///
/// Request and response records are keyed by wire keys (`field_<id>`);
/// name translation happens above this trait.
#[async_trait]
pub trait RowApi: Send + Sync {
    /// Fetch the field schema of a table.
    async fn table_fields(&self, table: &TableId) -> Result<Vec<FieldSchemaEntry>>;

    /// Create a row and return it as stored.
    async fn create_row(&self, table: &TableId, body: &Record) -> Result<Record>;

    /// Fetch one row.
    async fn get_row(&self, table: &TableId, row: &RowId) -> Result<Record>;

    /// Patch a row and return it as stored.
    async fn update_row(&self, table: &TableId, row: &RowId, body: &Record) -> Result<Record>;

    /// Delete a row. Whatever the API answers is discarded.
    async fn delete_row(&self, table: &TableId, row: &RowId) -> Result<()>;

    /// List rows matching `query`.
    ///
    /// [`RowLimit::All`] drains every page. [`RowLimit::AtMost`] returns at
    /// most that many rows, from the first page(s) only.
    async fn list_rows(
        &self,
        table: &TableId,
        query: &QueryParams,
        limit: RowLimit,
    ) -> Result<Vec<Record>>;
}
