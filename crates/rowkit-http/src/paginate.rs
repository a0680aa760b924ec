//! Page-number pagination over list endpoints.

use async_stream::try_stream;
use futures_util::{Stream, TryStreamExt, pin_mut};
use reqwest::Method;
use tracing::debug;

use rowkit_core::{QueryParams, Record, Result};

use crate::client::ApiClient;
use crate::endpoints::Page;

/// Page size used when draining a listing.
pub const PAGE_SIZE: u32 = 100;

/// Position in a page-number listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub size: u32,
}

impl PageCursor {
    pub fn first(size: u32) -> Self {
        Self { page: 1, size }
    }

    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Caller query parameters with this cursor's `page` and `size`.
    ///
    /// Any `page` or `size` already in `base` is replaced.
    pub fn apply(&self, base: &[(String, String)]) -> QueryParams {
        let mut params: QueryParams = base
            .iter()
            .filter(|(key, _)| key != "page" && key != "size")
            .cloned()
            .collect();
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("size".to_string(), self.size.to_string()));
        params
    }
}

/// Walks a listing page by page until the API reports no next page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a> {
    client: &'a ApiClient,
    page_size: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            page_size: PAGE_SIZE,
        }
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Stream of pages, starting at page 1.
    ///
    /// The stream ends after the first page whose `next` is null. The first
    /// failing page call ends it with that error.
    pub fn pages<'b>(
        &'b self,
        method: Method,
        path: &'b str,
        body: Option<&'b Record>,
        query: &'b [(String, String)],
    ) -> impl Stream<Item = Result<Page>> + 'b {
        let client = self.client;
        let mut cursor = PageCursor::first(self.page_size);

        try_stream! {
            loop {
                let params = cursor.apply(query);
                debug!(page = cursor.page, size = cursor.size, "Fetching page");

                let page: Page = client.execute_as(method.clone(), path, body, &params).await?;
                let has_next = page.has_next();
                yield page;

                if !has_next {
                    break;
                }
                cursor.advance();
            }
        }
    }

    /// Concatenate the results of every page in order.
    pub async fn fetch_all(
        &self,
        method: Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
    ) -> Result<Vec<Record>> {
        let pages = self.pages(method, path, body, query);
        pin_mut!(pages);

        let mut records = Vec::new();
        while let Some(page) = pages.try_next().await? {
            records.extend(page.results);
        }
        debug!(count = records.len(), "Fetched all pages");
        Ok(records)
    }

    /// Like [`fetch_all`](Self::fetch_all) but stops once `limit` records
    /// are collected, dropping any excess from the last page.
    pub async fn fetch_up_to(
        &self,
        method: Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
        limit: usize,
    ) -> Result<Vec<Record>> {
        let pages = self.pages(method, path, body, query);
        pin_mut!(pages);

        let mut records = Vec::new();
        while records.len() < limit {
            let Some(page) = pages.try_next().await? else {
                break;
            };
            records.extend(page.results);
        }
        records.truncate(limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_starts_at_page_one() {
        let mut cursor = PageCursor::first(PAGE_SIZE);
        assert_eq!(cursor.page, 1);
        cursor.advance();
        assert_eq!(cursor, PageCursor { page: 2, size: 100 });
    }

    #[test]
    fn cursor_replaces_caller_page_and_size() {
        let base = vec![
            ("size".to_string(), "5".to_string()),
            ("search".to_string(), "ada".to_string()),
            ("page".to_string(), "7".to_string()),
        ];
        let params = PageCursor::first(100).apply(&base);
        assert_eq!(
            params,
            vec![
                ("search".to_string(), "ada".to_string()),
                ("page".to_string(), "1".to_string()),
                ("size".to_string(), "100".to_string()),
            ]
        );
    }
}
