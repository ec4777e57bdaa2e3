//! Cursor-based list pagination.

use std::marker::PhantomData;

use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::client::Client;
use super::resources::decode;
use super::transport::RequestEnvelope;
use crate::error::{Error, Result};

pub const LIMIT_PARAM: &str = "limit";
pub const CURSOR_PARAM: &str = "cursor";

/// One page of a list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Cursor for the following page, absent on the last one.
    #[serde(rename = "next", default)]
    pub next_cursor: Option<String>,
    /// Total number of records in the collection, when the server reports it.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Lazy, restartable walk over a collection.
///
/// Each [`next_page`](Pager::next_page) issues exactly one request carrying
/// the cursor returned by the previous page. Nothing is buffered between
/// pages.
pub struct Pager<T> {
    client: Client,
    path: String,
    page_size: u32,
    params: Vec<(String, String)>,
    cursor: Option<String>,
    /// Records yielded since the walk started from the first page. `None`
    /// after a resume, since records before the cursor were never counted.
    seen: Option<u64>,
    done: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Pager<T> {
    pub(crate) fn new(client: Client, path: String, page_size: u32) -> Self {
        Self {
            client,
            path,
            page_size: page_size.max(1),
            params: Vec::new(),
            cursor: None,
            seen: Some(0),
            done: false,
            _item: PhantomData,
        }
    }

    /// Extra filter sent with every page request.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Continue from a cursor obtained earlier.
    ///
    /// A resumed walk ends on the last cursor or an empty page only: the
    /// reported total counts records before the cursor too.
    pub fn resume(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self.seen = None;
        self.done = false;
        self
    }

    /// Cursor the next request will carry.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page, or `None` once the collection is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
        if self.done {
            return Ok(None);
        }

        let mut envelope = RequestEnvelope::get(self.path.as_str()).param(LIMIT_PARAM, self.page_size);
        for (key, value) in &self.params {
            envelope = envelope.param(key.as_str(), value);
        }
        if let Some(ref cursor) = self.cursor {
            envelope = envelope.param(CURSOR_PARAM, cursor);
        }

        let value = self.client.execute(envelope).await?;
        let page: Page<T> = decode(value, "page")?;

        if page.items.is_empty() {
            self.done = true;
            return Ok(None);
        }

        let fetched = page.items.len() as u64;
        self.seen = self.seen.map(|seen| seen + fetched);
        let reached_total = match (self.seen, page.total) {
            (Some(seen), Some(total)) => seen >= total,
            _ => false,
        };
        self.cursor = page.next_cursor.clone();
        if self.cursor.is_none() || reached_total {
            self.done = true;
        }

        debug!(
            path = %self.path,
            items = page.items.len(),
            seen = ?self.seen,
            total = ?page.total,
            "Fetched page"
        );
        Ok(Some(page))
    }

    /// Yield records one by one, fetching pages as they are consumed.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok::<_, Error>(page.map(|page| {
                (stream::iter(page.items.into_iter().map(Ok::<T, Error>)), pager)
            }))
        })
        .try_flatten()
    }

    /// Drain every remaining page into memory.
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.into_stream().try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parsing() {
        let page: Page<i64> =
            serde_json::from_str(r#"{"items":[1,2,3],"next":"c2","total":7}"#).unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.next_cursor.as_deref(), Some("c2"));
        assert_eq!(page.total, Some(7));
    }

    #[test]
    fn test_last_page_parsing() {
        let page: Page<i64> = serde_json::from_str(r#"{"items":[7],"next":null}"#).unwrap();
        assert!(page.next_cursor.is_none());
        assert!(page.total.is_none());

        let empty: Page<i64> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
