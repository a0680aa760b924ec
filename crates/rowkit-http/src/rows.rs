//! [`RowApi`] over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use rowkit_core::{FieldSchemaEntry, QueryParams, Record, Result, RowApi, RowId, RowLimit, TableId};

use crate::client::ApiClient;
use crate::endpoints::{self, MAX_PAGE_SIZE, Page};

#[async_trait]
impl RowApi for ApiClient {
    #[instrument(skip(self))]
    async fn table_fields(&self, table: &TableId) -> Result<Vec<FieldSchemaEntry>> {
        let fields: Vec<FieldSchemaEntry> = self
            .execute_as(Method::GET, &endpoints::table_fields(table), None, &[])
            .await?;
        debug!(count = fields.len(), "Loaded table schema");
        Ok(fields)
    }

    async fn create_row(&self, table: &TableId, body: &Record) -> Result<Record> {
        self.execute_as(Method::POST, &endpoints::table_rows(table), Some(body), &[])
            .await
    }

    async fn get_row(&self, table: &TableId, row: &RowId) -> Result<Record> {
        self.execute_as(Method::GET, &endpoints::table_row(table, row), None, &[])
            .await
    }

    async fn update_row(&self, table: &TableId, row: &RowId, body: &Record) -> Result<Record> {
        self.execute_as(Method::PATCH, &endpoints::table_row(table, row), Some(body), &[])
            .await
    }

    async fn delete_row(&self, table: &TableId, row: &RowId) -> Result<()> {
        self.execute_no_response(Method::DELETE, &endpoints::table_row(table, row), None, &[])
            .await
    }

    #[instrument(skip(self, query))]
    async fn list_rows(
        &self,
        table: &TableId,
        query: &QueryParams,
        limit: RowLimit,
    ) -> Result<Vec<Record>> {
        let path = endpoints::table_rows(table);

        match limit {
            RowLimit::All => self.paginator().fetch_all(Method::GET, &path, None, query).await,
            RowLimit::AtMost(n) if n <= MAX_PAGE_SIZE => {
                let mut params: QueryParams = query
                    .iter()
                    .filter(|(key, _)| key != "size")
                    .cloned()
                    .collect();
                params.push(("size".to_string(), n.to_string()));

                let page: Page = self.execute_as(Method::GET, &path, None, &params).await?;
                Ok(page.results)
            }
            RowLimit::AtMost(n) => {
                debug!(limit = n, "Limit exceeds one page, paging up to it");
                self.paginator()
                    .page_size(MAX_PAGE_SIZE)
                    .fetch_up_to(Method::GET, &path, None, query, n as usize)
                    .await
            }
        }
    }
}
